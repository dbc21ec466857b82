pub mod error;
pub mod source;

pub use error::classify_mongo_driver_error;
pub use source::MongoSource;
