mod data_type;
pub mod registry;

pub use data_type::DataType;
pub use registry::*;
