pub mod batch;
pub mod contracts;
pub mod namespace;
pub mod oplog;
pub mod row;
pub mod timestamp;
pub mod value;

pub use batch::Batch;
pub use namespace::Namespace;
pub use oplog::{OpCode, OplogEntry};
pub use row::RowTuple;
pub use timestamp::ResumeTimestamp;
pub use value::Value;
