pub mod json_store;
pub mod schema;
pub mod score_store;

pub use json_store::JsonStore;
pub use score_store::{KeyValueStore, MemoryStore, ScoreStore};
