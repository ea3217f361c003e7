pub mod arena;
pub mod error;
pub mod result;
pub mod value;

pub use arena::Arena;
pub use error::{DecodeError, ErrorKind};
pub use result::{ColumnDescriptor, DecodeMode, RawCell, ResultSet};
pub use value::Value;
