use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("host message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("host message must be a JSON object")]
    NotAnObject,
    #[error("host message is missing the `command` discriminator")]
    MissingCommand,
    #[error("malformed `{command}` payload: {reason}")]
    MalformedPayload { command: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid SCENARIO_PANEL_TOOLTIP_DISMISS_MS: {0}")]
    InvalidTooltipDismissMs(String),
    #[error("invalid SCENARIO_PANEL_DEFAULT_SORT_MODE: {0}")]
    InvalidDefaultSortMode(String),
    #[error("SCENARIO_PANEL_LOG must not be empty")]
    EmptyLogFilter,
}

/// Validation failures for user actions that carry free-form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("group name must not be empty")]
    EmptyGroupName,
    #[error("group `{0}` does not exist")]
    UnknownGroup(String),
    #[error("group `{0}` already exists")]
    GroupNameTaken(String),
    #[error("scenario `{0}` does not exist")]
    UnknownScenario(String),
    #[error("scenario `{0}` has no file uri")]
    MissingScenarioUri(String),
    #[error("favorite uri must not be empty")]
    EmptyFavoriteUri,
}
