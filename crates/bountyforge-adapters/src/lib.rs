//! Tool adapters for the BountyForge scan pipeline engine.
//!
//! Each module wraps one external recon/scanning binary behind the
//! `bountyforge_core::adapter::Adapter` trait: resolve it on PATH, build
//! its argv from a merged `ToolInvocation`, run it under a timeout, and
//! parse its output into `ParsedRecord`s. `registry` collects all six
//! into the lookup surface the pipeline engine drives.

pub mod fuzzer;
pub mod headers;
pub mod httpprobe;
pub mod json_lines;
pub mod portscan;
pub mod process;
pub mod registry;
pub mod subfinder;
pub mod templatescan;

pub use fuzzer::{FuzzerDirectoryAdapter, FuzzerSubdomainAdapter};
pub use httpprobe::HttpxAdapter;
pub use portscan::NmapAdapter;
pub use registry::{AdapterRegistry, AvailabilityStatus};
pub use subfinder::SubfinderAdapter;
pub use templatescan::NucleiAdapter;
