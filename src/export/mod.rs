//! Output serialization.

pub mod obj;

pub use obj::{geometry_string, material_string, write_files, MtlTemplate, MTL_FILE_NAME};
