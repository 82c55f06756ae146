//! Adapter registry: resolves a stage to its executor by
//! name, keyed by `StageName`.

use std::collections::HashMap;
use std::sync::Arc;

use bountyforge_core::adapter::Adapter;
use bountyforge_core::stage::StageName;
use futures::future::join_all;
use serde::Serialize;

use crate::fuzzer::{FuzzerDirectoryAdapter, FuzzerSubdomainAdapter};
use crate::httpprobe::HttpxAdapter;
use crate::portscan::NmapAdapter;
use crate::subfinder::SubfinderAdapter;
use crate::templatescan::NucleiAdapter;

/// Reported availability of a single adapter's backing binary.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityStatus {
    pub stage: StageName,
    pub binary: &'static str,
    pub available: bool,
    pub version: Option<String>,
}

/// Holds one adapter instance per known stage, resolvable by stage or by
/// binary/tool name.
pub struct AdapterRegistry {
    adapters: HashMap<StageName, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.stage(), adapter);
    }

    /// The registry pre-populated with the six built-in tool adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SubfinderAdapter::new()));
        registry.register(Arc::new(FuzzerSubdomainAdapter::new()));
        registry.register(Arc::new(NmapAdapter::new()));
        registry.register(Arc::new(HttpxAdapter::new()));
        registry.register(Arc::new(FuzzerDirectoryAdapter::new()));
        registry.register(Arc::new(NucleiAdapter::new()));
        registry
    }

    /// Look up the adapter for a stage.
    pub fn get(&self, stage: StageName) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(&stage).cloned()
    }

    /// Look up an adapter by name, accepting both canonical stage names
    /// and tool-name aliases.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        name.parse::<StageName>().ok().and_then(|stage| self.get(stage))
    }

    /// The stages this registry has an adapter for, in canonical order.
    pub fn list(&self) -> Vec<StageName> {
        StageName::CANONICAL_ORDER
            .iter()
            .copied()
            .filter(|stage| self.adapters.contains_key(stage))
            .collect()
    }

    /// Probe every registered adapter's backing binary concurrently.
    pub async fn check_availability(&self) -> Vec<AvailabilityStatus> {
        let checks = self.list().into_iter().map(|stage| {
            let adapter = self.adapters[&stage].clone();
            async move {
                let version = adapter.version().await;
                AvailabilityStatus {
                    stage,
                    binary: stage.binary_name(),
                    available: version.is_some(),
                    version,
                }
            }
        });
        join_all(checks).await
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_all_canonical_stages() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.list(), StageName::CANONICAL_ORDER);
    }

    #[test]
    fn get_by_name_accepts_tool_alias() {
        let registry = AdapterRegistry::with_defaults();
        assert!(registry.get_by_name("nmap").is_some());
        assert!(registry.get_by_name("port_scan").is_some());
        assert!(registry.get_by_name("not-a-tool").is_none());
    }
}
