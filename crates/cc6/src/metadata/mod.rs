//! Metadata adapter: the engine's read-only view of a dataset.

mod adapter;
mod host;
mod node;
mod value;

pub use adapter::{MetadataAdapter, MetadataSnapshot};
pub use host::{DatasetEncoding, DatasetHeader, HostDataset, HostDimension, VariableHeader};
pub use node::{Dimension, FileFormat, MetadataNode, NodeScope};
pub use value::AttrValue;
pub(crate) use value::format_number;
