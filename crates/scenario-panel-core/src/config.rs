use std::time::Duration;

use crate::error::ConfigError;
use crate::favorites::{SortMode, parse_sort_mode};
use crate::overlay::DEFAULT_TOOLTIP_DISMISS_DELAY;

pub const ENV_TOOLTIP_DISMISS_MS: &str = "SCENARIO_PANEL_TOOLTIP_DISMISS_MS";
pub const ENV_DEFAULT_SORT_MODE: &str = "SCENARIO_PANEL_DEFAULT_SORT_MODE";
pub const ENV_LOG_FILTER: &str = "SCENARIO_PANEL_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub tooltip_dismiss_delay: Duration,
    /// Sort mode used until the host sends its own.
    pub default_sort_mode: SortMode,
    pub log_filter: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            tooltip_dismiss_delay: DEFAULT_TOOLTIP_DISMISS_DELAY,
            default_sort_mode: SortMode::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PanelConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(raw) = read(ENV_TOOLTIP_DISMISS_MS) {
            let millis = raw
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidTooltipDismissMs(format!("{raw}: {error}")))?;
            config.tooltip_dismiss_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = read(ENV_DEFAULT_SORT_MODE) {
            config.default_sort_mode =
                parse_sort_mode(&raw).ok_or(ConfigError::InvalidDefaultSortMode(raw))?;
        }

        if let Some(raw) = lookup(ENV_LOG_FILTER) {
            let filter = raw.trim();
            if filter.is_empty() {
                return Err(ConfigError::EmptyLogFilter);
            }
            config.log_filter = filter.to_string();
        }

        Ok(config)
    }
}
