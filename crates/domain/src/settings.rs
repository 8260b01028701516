//! Bridge Settings Domain Model
//!
//! Host-level configuration for the code generation bridge.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::escaping::EscapingTier;

/// Environment variable overriding [`BridgeSettings::asset_root`].
pub const ENV_ASSET_ROOT: &str = "BLOCKGEN_ASSETS";
/// Environment variable overriding [`BridgeSettings::legacy_engine`].
pub const ENV_LEGACY_ENGINE: &str = "BLOCKGEN_LEGACY_ENGINE";
/// Environment variable overriding [`BridgeSettings::generation_timeout_ms`].
pub const ENV_TIMEOUT_MS: &str = "BLOCKGEN_TIMEOUT_MS";

/// Configuration for the code generation bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Directory resource identifiers are resolved against.
    pub asset_root: PathBuf,
    /// Whether the host only provides a legacy engine.
    pub legacy_engine: bool,
    /// Per-request generation deadline. `None` or `0` waits indefinitely.
    pub generation_timeout_ms: Option<u64>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            legacy_engine: false,
            generation_timeout_ms: None,
        }
    }
}

impl BridgeSettings {
    /// Returns the escaping tier implied by the host capability flag.
    #[must_use]
    pub const fn escaping_tier(&self) -> EscapingTier {
        EscapingTier::from_legacy_flag(self.legacy_engine)
    }

    /// Returns the generation deadline, if any. A zero deadline means none.
    #[must_use]
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(ENV_ASSET_ROOT).filter(|v| !v.trim().is_empty()) {
            self.asset_root = PathBuf::from(root);
        }
        if let Some(legacy) = lookup(ENV_LEGACY_ENGINE).and_then(|v| parse_flag(&v)) {
            self.legacy_engine = legacy;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            match timeout.trim() {
                "" | "none" | "0" => self.generation_timeout_ms = None,
                value => {
                    if let Ok(ms) = value.parse() {
                        self.generation_timeout_ms = Some(ms);
                    }
                }
            }
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.asset_root, PathBuf::from("assets"));
        assert_eq!(settings.escaping_tier(), EscapingTier::Modern);
        assert_eq!(settings.generation_timeout(), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: BridgeSettings =
            serde_json::from_str(r#"{"legacy_engine": true}"#).unwrap();
        assert!(settings.legacy_engine);
        assert_eq!(settings.asset_root, PathBuf::from("assets"));
        assert_eq!(settings.escaping_tier(), EscapingTier::Legacy);
    }

    #[test]
    fn test_overrides() {
        let settings = BridgeSettings::default().with_overrides(lookup(&[
            (ENV_ASSET_ROOT, "/srv/assets"),
            (ENV_LEGACY_ENGINE, "yes"),
            (ENV_TIMEOUT_MS, "250"),
        ]));
        assert_eq!(settings.asset_root, PathBuf::from("/srv/assets"));
        assert!(settings.legacy_engine);
        assert_eq!(
            settings.generation_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let base = BridgeSettings {
            generation_timeout_ms: Some(10),
            ..BridgeSettings::default()
        };
        let settings = base.clone().with_overrides(lookup(&[
            (ENV_LEGACY_ENGINE, "maybe"),
            (ENV_TIMEOUT_MS, "soon"),
        ]));
        assert_eq!(settings, base);

        let cleared = base.with_overrides(lookup(&[(ENV_TIMEOUT_MS, "none")]));
        assert_eq!(cleared.generation_timeout_ms, None);
    }

    #[test]
    fn test_zero_timeout_waits_indefinitely() {
        let settings: BridgeSettings =
            serde_json::from_str(r#"{"generation_timeout_ms": 0}"#).unwrap();
        assert_eq!(settings.generation_timeout_ms, Some(0));
        assert_eq!(settings.generation_timeout(), None);
    }
}
