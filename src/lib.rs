pub mod config;
pub mod error;
pub mod graphics;

pub use config::StagingConfig;
pub use error::{Error, Result};
