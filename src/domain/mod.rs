pub mod defaults;
pub mod descriptors;
pub mod error;
pub mod plan;
pub mod ports;
pub mod source_type;
pub mod sqlite_type;
pub mod value;
