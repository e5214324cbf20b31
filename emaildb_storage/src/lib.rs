pub mod block;
pub mod database;
pub mod options;

pub use block::{Block, EncodeOptions};
pub use database::{Database, DatabaseStats};
pub use options::DatabaseOptions;

pub use emaildb_core::{CompressionAlgorithm, Error, Result};
