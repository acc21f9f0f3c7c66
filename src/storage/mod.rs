//! Local JSON document storage.

pub mod json;

pub use json::{dump_json, load_json, to_json_string, JsonWriteOptions};
