pub mod array;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod marshal;
pub mod registry;

pub use error::EngineError;
pub use marshal::ResultMarshaler;
pub use registry::{TypeEntry, TypeRegistry, TypeRegistryBuilder};
