// Utilities shared by the RSA operations

pub mod source;

pub use source::{ByteSource, SourceConfig};
