//! The Configuration Merger: a pure function that combines
//! ambient `ScannerDefaults` with a job's per-stage overrides into the
//! `StageSpec` the Pipeline Engine hands to an adapter. No I/O happens
//! here — loading defaults from disk is `ScannerDefaults::from_kdl`'s
//! job, not this one's.

use std::time::Duration;

use bountyforge_core::job::{StageOverrides, StageSpec};
use bountyforge_core::stage::StageName;

use crate::defaults::ScannerDefaults;

const DEFAULT_TIMEOUT_SECS: u64 = 7200;

pub struct ConfigurationMerger;

impl ConfigurationMerger {
    /// Merge ambient defaults for `stage` with a job's explicit
    /// `overrides`, applying job-level `exclude` verbatim. Fields set in
    /// `overrides` always win; everything else falls back to
    /// `defaults`, then to a hardcoded floor ("Idempotent
    /// merge" — calling this twice with the same inputs yields an
    /// identical `StageSpec`).
    pub fn merge(
        stage: StageName,
        defaults: &ScannerDefaults,
        overrides: &StageOverrides,
        exclude: &[String],
    ) -> StageSpec {
        let stage_defaults = defaults.for_stage(stage);

        StageSpec {
            stage,
            scan_mode: overrides
                .scan_mode
                .or(stage_defaults.scan_mode)
                .unwrap_or_default(),
            exclude: exclude.to_vec(),
            extra_argv: overrides
                .additional_flags
                .clone()
                .or(stage_defaults.additional_flags)
                .unwrap_or_default(),
            wordlist: overrides.wordlist.clone().or(stage_defaults.wordlist),
            templates_dir: overrides.templates_dir.clone().or(stage_defaults.templates_dir),
            rate_limit: overrides
                .rate_limit
                .or(stage_defaults.rate_limit)
                .or(defaults.rate_limit),
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(stage_defaults.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            headers: overrides.headers.clone().or(stage_defaults.headers).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bountyforge_core::scan_mode::ScanMode;

    #[test]
    fn overrides_win_over_defaults() {
        let mut defaults = ScannerDefaults::default();
        defaults.per_stage.insert(
            StageName::HttpProbe,
            StageOverrides {
                scan_mode: Some(ScanMode::Live),
                ..Default::default()
            },
        );
        let overrides = StageOverrides {
            scan_mode: Some(ScanMode::Recon),
            ..Default::default()
        };
        let spec = ConfigurationMerger::merge(StageName::HttpProbe, &defaults, &overrides, &[]);
        assert_eq!(spec.scan_mode, ScanMode::Recon);
    }

    #[test]
    fn merge_is_idempotent() {
        let defaults = ScannerDefaults::default();
        let overrides = StageOverrides {
            wordlist: Some("list.txt".to_string()),
            ..Default::default()
        };
        let exclude = vec!["skip.com".to_string()];
        let first = ConfigurationMerger::merge(StageName::DirectoryBruteforce, &defaults, &overrides, &exclude);
        let second = ConfigurationMerger::merge(StageName::DirectoryBruteforce, &defaults, &overrides, &exclude);
        assert_eq!(first.wordlist, second.wordlist);
        assert_eq!(first.timeout, second.timeout);
    }

    #[test]
    fn falls_back_to_hardcoded_timeout_floor() {
        let defaults = ScannerDefaults::default();
        let overrides = StageOverrides::default();
        let spec = ConfigurationMerger::merge(StageName::PortScan, &defaults, &overrides, &[]);
        assert_eq!(spec.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    }
}
