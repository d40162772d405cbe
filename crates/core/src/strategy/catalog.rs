//! Built-in strategies and per-platform lookup.

use std::collections::HashMap;
use thiserror::Error;

use super::config::StrategyOrderConfig;
use super::types::{ClientProfile, StrategySpec};
use crate::platform::Platform;

/// The five built-in strategies, in default preference order.
pub fn builtin_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::new("cookies", ClientProfile::None)
            .with_credential_file()
            .with_post_processing(),
        StrategySpec::new("android", ClientProfile::MobileA),
        StrategySpec::new("ios", ClientProfile::MobileB),
        StrategySpec::new("web", ClientProfile::GeneralWeb),
        StrategySpec::new("minimal", ClientProfile::Minimal),
    ]
}

/// The order config names a strategy that does not exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown strategy '{name}' configured for {platform}")]
pub struct UnknownStrategy {
    pub name: String,
    pub platform: Platform,
}

/// Resolved strategy lists per platform.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    by_platform: HashMap<Platform, Vec<StrategySpec>>,
}

impl StrategyCatalog {
    /// Resolve the configured order against the built-in strategies.
    pub fn new(order: &StrategyOrderConfig) -> Result<Self, UnknownStrategy> {
        Self::with_specs(builtin_strategies(), order)
    }

    /// Resolve the configured order against an explicit set of specs.
    pub fn with_specs(
        specs: Vec<StrategySpec>,
        order: &StrategyOrderConfig,
    ) -> Result<Self, UnknownStrategy> {
        let known: HashMap<&str, &StrategySpec> =
            specs.iter().map(|s| (s.name.as_str(), s)).collect();

        let mut by_platform = HashMap::new();
        for platform in Platform::SUPPORTED {
            let resolved = order
                .order_for(platform)
                .iter()
                .map(|name| {
                    known
                        .get(name.as_str())
                        .map(|spec| (*spec).clone())
                        .ok_or_else(|| UnknownStrategy {
                            name: name.clone(),
                            platform,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            by_platform.insert(platform, resolved);
        }

        Ok(Self { by_platform })
    }

    /// Strategies to try for `platform`, in order. Empty for unsupported URLs.
    pub fn for_platform(&self, platform: Platform) -> &[StrategySpec] {
        self.by_platform
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        // The default order only names built-ins.
        Self::new(&StrategyOrderConfig::default()).unwrap_or_else(|_| Self {
            by_platform: HashMap::new(),
        })
    }
}
