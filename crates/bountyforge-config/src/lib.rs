//! Scanner defaults and the Configuration Merger for BountyForge.
//!
//! `ScannerDefaults` loads the ambient per-tool defaults from a KDL
//! document; `ConfigurationMerger` combines those defaults with a job's
//! explicit per-stage overrides into the `StageSpec` the Pipeline Engine
//! hands to an adapter. Loading configuration from disk or environment
//! is this crate's job; the engine itself only ever sees merged specs.

pub mod defaults;
pub mod error;
pub mod merger;

pub use defaults::ScannerDefaults;
pub use error::{ConfigError, ConfigResult};
pub use merger::ConfigurationMerger;
