//! Controlled-vocabulary repository.
//!
//! CV tables are JSON documents published per project (for CORDEX-CMIP6 the
//! `CORDEX-CMIP6_<table>.json` files of the CMOR tables repository). They are
//! loaded once, merged into an immutable [`CvTable`] and shared between
//! checks through the [`CvRepository`] cache.

mod node;
mod path;
mod repository;
mod source;
mod table;

pub use node::CvNode;
pub use path::VocabularyPath;
pub use repository::CvRepository;
pub use source::{CvSource, InMemorySource, TablesDirectory, LATEST_VERSION};
pub use table::{resolve, CvTable};
