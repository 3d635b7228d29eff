//! Configuration schema and JSONC loader for the 3D human-pose training
//! pipeline. The trainer and the prediction process consume the bound
//! [`Config`]; this crate only parses and validates it.

pub mod common;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::{ConfigError, Result, ValidationReason};
