pub mod config;
pub mod error;
pub mod kg;
pub mod storage;

pub use config::Config;
pub use error::{KgError, Result};
pub use kg::{KgSearchClient, RelationSet, SearchBackend};
pub use storage::{dump_json, load_json, JsonWriteOptions};
