//! SDK config loader (strict parsing).

pub mod schema;

use std::fs;

use amonitor_core::error::{AmonitorError, Result};

pub use schema::{SdkConfig, ServerSection, TargetSection};

pub fn load_from_file(path: &str) -> Result<SdkConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AmonitorError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<SdkConfig> {
    let cfg: SdkConfig = serde_yaml::from_str(s)
        .map_err(|e| AmonitorError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
