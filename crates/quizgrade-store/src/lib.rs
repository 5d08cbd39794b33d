//! quizgrade-store: Quiz and attempt stores.
//!
//! Implements the `QuizSource` and `AttemptStore` traits in memory and on
//! disk, and opens the store a configuration file describes.

pub mod config;
pub mod directory;
pub mod error;
pub mod memory;

pub use config::{load_config, load_config_from, open_store, OutputFormat, QuizgradeConfig, Store, StoreConfig};
pub use directory::DirectoryStore;
pub use error::StoreError;
pub use memory::MemoryStore;
