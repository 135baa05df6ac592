pub mod config;
pub mod types;

pub use config::{load_runtime_config, RuntimeConfig};
pub use types::*;
