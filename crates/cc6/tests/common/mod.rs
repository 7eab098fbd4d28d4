//! Shared fixtures: a small CORDEX-CMIP6 CV and a compliant dataset header.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use cc6::{CheckerConfig, DatasetHeader};

pub const PROJECT: &str = "CORDEX-CMIP6";

/// Table documents keyed by table name.
pub fn cv_tables() -> Vec<(&'static str, Value)> {
    vec![
        (
            "CV",
            json!({
                "CV": {
                    "required_global_attributes": [
                        "activity_id", "creation_date", "domain", "domain_id",
                        "driving_experiment", "driving_experiment_id", "driving_source_id",
                        "driving_variant_label", "frequency", "institution", "institution_id",
                        "mip_era", "product", "project_id", "source_id", "source_type",
                        "tracking_id", "variable_id", "version_realization"
                    ],
                    "activity_id": {"DD": "Dynamical downscaling", "ESD": "Empirical statistical downscaling"},
                    "domain_id": {
                        "EUR-12": {"domain": "Europe", "grid_resolution": "0.11"},
                        "AFR-50": {"domain": "Africa", "grid_resolution": "0.44"}
                    },
                    "driving_experiment_id": {
                        "historical": "all-forcing simulation of the recent past",
                        "ssp370": "update of RCP7.0 based on SSP3"
                    },
                    "driving_source_id": {"MPI-ESM1-2-HR": "MPI-ESM1.2-HR", "NorESM2-MM": "NorESM2-MM"},
                    "driving_variant_label": [r"r[[:digit:]]\{1,\}i[[:digit:]]\{1,\}p[[:digit:]]\{1,\}f[[:digit:]]\{1,\}$"],
                    "frequency": {"1hr": "sampled hourly", "6hr": "6 hourly", "day": "daily", "mon": "monthly", "fx": "fixed"},
                    "institution_id": {
                        "GERICS": "Climate Service Center Germany",
                        "DMI": "Danish Meteorological Institute"
                    },
                    "mip_era": ["CMIP6"],
                    "product": ["model-output"],
                    "project_id": ["CORDEX"],
                    "source_id": {"REMO2020": {"label": "REMO2020"}, "HCLIM43-ALADIN": {"label": "HCLIM"}},
                    "source_type": {"ARCM": "Atmospheric Regional Climate Model", "AORCM": "Coupled RCM"},
                    "version_realization": [r"v[[:digit:]]\{1,\}-r[[:digit:]]\{1,\}"]
                }
            }),
        ),
        (
            "coordinate",
            json!({
                "axis_entry": {
                    "time": {"out_name": "time", "axis": "T", "value": ""},
                    "latitude": {"out_name": "lat", "axis": "Y", "value": ""},
                    "longitude": {"out_name": "lon", "axis": "X", "value": ""},
                    "height2m": {"out_name": "height", "axis": "Z", "value": "2.0"}
                }
            }),
        ),
        (
            "grids",
            json!({
                "axis_entry": {
                    "grid_latitude": {"out_name": "rlat", "axis": "Y"},
                    "grid_longitude": {"out_name": "rlon", "axis": "X"}
                },
                "variable_entry": {
                    "latitude": {"out_name": "lat"},
                    "longitude": {"out_name": "lon"},
                    "vertices_latitude": {"out_name": "vertices_latitude"}
                }
            }),
        ),
        ("formula_terms", json!({"formula_entry": {"ptop": {"out_name": "ptop"}}})),
        (
            "1hr",
            json!({"variable_entry": {"pr": variable_entry("1hr", "precipitation_flux", "kg m-2 s-1", "Precipitation", "area: time: mean")}}),
        ),
        ("6hr", json!({"variable_entry": {}})),
        (
            "day",
            json!({"variable_entry": {
                "tas": variable_entry("day", "air_temperature", "K", "Near-Surface Air Temperature", "area: mean time: mean"),
                "pr": variable_entry("day", "precipitation_flux", "kg m-2 s-1", "Precipitation", "area: time: mean")
            }}),
        ),
        (
            "mon",
            json!({"variable_entry": {
                "tas": variable_entry("mon", "air_temperature", "K", "Near-Surface Air Temperature", "area: time: mean")
            }}),
        ),
        (
            "fx",
            json!({"variable_entry": {"orog": {
                "frequency": "fx",
                "standard_name": "surface_altitude",
                "units": "m",
                "long_name": "Surface Altitude",
                "cell_methods": "area: mean",
                "dimensions": "longitude latitude"
            }}}),
        ),
    ]
}

fn variable_entry(frequency: &str, standard_name: &str, units: &str, long_name: &str, cell_methods: &str) -> Value {
    json!({
        "frequency": frequency,
        "standard_name": standard_name,
        "units": units,
        "long_name": long_name,
        "cell_methods": cell_methods,
        "dimensions": "longitude latitude time height2m"
    })
}

/// Write the fixture tables as `<project>_<table>.json` files.
pub fn write_tables(dir: &Path) {
    for (name, document) in cv_tables() {
        let path = dir.join(format!("{}_{}.json", PROJECT, name));
        fs::write(path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
    }
}

/// A temporary tables directory plus a config pointing at it.
pub fn tables_dir() -> (TempDir, CheckerConfig) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tables(dir.path());
    let config = CheckerConfig::default().with_tables_path(dir.path());
    (dir, config)
}

/// Days from 1950-01-01 to 1954-12-31, one daily file chunk.
pub const DAYS_1950_1954: usize = 1826;

/// Mid-day stamps in "days since 1950-01-01" for `days` consecutive days.
pub fn daily_means(days: usize) -> Vec<f64> {
    (0..days).map(|day| day as f64 + 0.5).collect()
}

/// A compliant daily `tas` header on a rotated-pole grid, covering the
/// five years 1950-1954.
pub fn compliant_header_json() -> Value {
    json!({
        "attrs": {
            "activity_id": "DD",
            "creation_date": "2024-05-01T12:00:00Z",
            "domain": "Europe",
            "domain_id": "EUR-12",
            "driving_experiment": "all-forcing simulation of the recent past",
            "driving_experiment_id": "historical",
            "driving_source_id": "MPI-ESM1-2-HR",
            "driving_variant_label": "r1i1p1f1",
            "frequency": "day",
            "institution": "Climate Service Center Germany",
            "institution_id": "GERICS",
            "mip_era": "CMIP6",
            "product": "model-output",
            "project_id": "CORDEX",
            "source_id": "REMO2020",
            "source_type": "ARCM",
            "tracking_id": "hdl:21.14103/0c0b6b5e-1f6a-4d8c-9e3b-2a1f7c9d8e01",
            "variable_id": "tas",
            "version_realization": "v1-r1"
        },
        "dims": {"time": DAYS_1950_1954, "rlat": 4, "rlon": 5, "bnds": 2},
        "coords": {
            "time": {
                "dims": ["time"],
                "attrs": {
                    "standard_name": "time",
                    "units": "days since 1950-01-01 00:00:00",
                    "calendar": "proleptic_gregorian",
                    "bounds": "time_bnds"
                },
                "data": daily_means(DAYS_1950_1954)
            },
            "rlat": {"dims": ["rlat"], "attrs": {"standard_name": "grid_latitude", "units": "degrees"}},
            "rlon": {"dims": ["rlon"], "attrs": {"standard_name": "grid_longitude", "units": "degrees"}},
            "lat": {"dims": ["rlat", "rlon"], "attrs": {"standard_name": "latitude", "units": "degrees_north"}},
            "lon": {"dims": ["rlat", "rlon"], "attrs": {"standard_name": "longitude", "units": "degrees_east"}},
            "height": {"dims": [], "attrs": {"standard_name": "height", "units": "m"}}
        },
        "data_vars": {
            "tas": {
                "dims": ["time", "rlat", "rlon"],
                "attrs": {
                    "standard_name": "air_temperature",
                    "units": "K",
                    "long_name": "Near-Surface Air Temperature",
                    "cell_methods": "area: mean time: mean",
                    "grid_mapping": "rotated_pole",
                    "coordinates": "lat lon height"
                },
                "dtype": "float32",
                "encoding": {"zlib": true, "complevel": 1, "shuffle": true}
            },
            "time_bnds": {"dims": ["time", "bnds"], "attrs": {}},
            "rotated_pole": {"dims": [], "attrs": {"grid_mapping_name": "rotated_latitude_longitude"}}
        },
        "encoding": {
            "unlimited_dims": ["time"],
            "data_model": "NETCDF4_CLASSIC",
            "disk_format": "HDF5"
        }
    })
}

/// Parse a header from JSON.
pub fn header(value: &Value) -> DatasetHeader {
    DatasetHeader::from_json_str(&value.to_string()).expect("valid header")
}

/// The compliant header with `edit` applied.
pub fn header_with(edit: impl FnOnce(&mut Value)) -> DatasetHeader {
    let mut value = compliant_header_json();
    edit(&mut value);
    header(&value)
}
