//! Typed host <-> panel message boundary.
//!
//! Every message is a JSON object carrying a `command` discriminator. Inbound
//! payloads are read leniently: a bad entry inside a list is dropped with a
//! warning instead of failing the whole message.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::control_gate::FeatureFlags;
use crate::error::ProtocolError;
use crate::favorites::{FavoriteEntry, SortMode, parse_sort_mode};
use crate::run_status::RunRecordPayload;
use crate::scenario_state::{ApplyChangesPayload, GroupSnapshot, ScenarioSnapshot};

pub const SUPPORTED_INBOUND_COMMANDS: &[&str] = &[
    "loadInitialState",
    "updateRunArtifactsState",
    "updateFavoritesState",
    "updateAffectedMainScenarios",
    "updateStatus",
    "setRefreshButtonState",
    "buildStateChanged",
];

pub const SUPPORTED_OUTBOUND_COMMANDS: &[&str] = &[
    "applyChanges",
    "runScenarioInVanessa",
    "runScenarioManualInVanessa",
    "debugScenarioInVanessa",
    "addFavorite",
    "removeFavorite",
    "setFavoritesSortMode",
    "renameGroup",
    "refreshData",
    "cancelBuild",
    "openScenario",
    "openRunLog",
    "watchLiveLog",
    "openFeatureArtifact",
    "createScenario",
    "createGroup",
    "createParameterFile",
    "openSettings",
];

/// Full snapshot pushed by the host on start-up and on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialState {
    pub error: Option<String>,
    pub groups: Vec<GroupSnapshot>,
    pub run_artifacts: BTreeMap<String, RunRecordPayload>,
    pub favorites: Vec<FavoriteEntry>,
    pub favorites_sort_mode: Option<SortMode>,
    pub build_in_progress: bool,
    pub feature_flags: FeatureFlags,
    pub affected_main_scenarios: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    LoadInitialState(Box<InitialState>),
    /// `None` is the host saying there are no run artifacts at all.
    UpdateRunArtifactsState {
        run_artifacts: Option<BTreeMap<String, RunRecordPayload>>,
    },
    UpdateFavoritesState {
        favorites: Vec<FavoriteEntry>,
        sort_mode: Option<SortMode>,
    },
    UpdateAffectedMainScenarios {
        scenarios: Vec<String>,
    },
    UpdateStatus {
        text: String,
        enable_controls: Option<bool>,
        refresh_button_enabled: Option<bool>,
    },
    SetRefreshButtonState {
        enabled: bool,
    },
    BuildStateChanged {
        in_progress: bool,
        feature_flags: Option<FeatureFlags>,
    },
    Unknown {
        command: String,
    },
}

impl InboundMessage {
    pub fn command(&self) -> &str {
        match self {
            Self::LoadInitialState(_) => "loadInitialState",
            Self::UpdateRunArtifactsState { .. } => "updateRunArtifactsState",
            Self::UpdateFavoritesState { .. } => "updateFavoritesState",
            Self::UpdateAffectedMainScenarios { .. } => "updateAffectedMainScenarios",
            Self::UpdateStatus { .. } => "updateStatus",
            Self::SetRefreshButtonState { .. } => "setRefreshButtonState",
            Self::BuildStateChanged { .. } => "buildStateChanged",
            Self::Unknown { command } => command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "command",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum OutboundMessage {
    ApplyChanges(ApplyChangesPayload),
    RunScenarioInVanessa {
        name: String,
    },
    RunScenarioManualInVanessa {
        name: String,
    },
    DebugScenarioInVanessa {
        name: String,
    },
    AddFavorite(FavoriteEntry),
    RemoveFavorite {
        uri: String,
    },
    SetFavoritesSortMode {
        sort_mode: SortMode,
    },
    RenameGroup {
        old_name: String,
        new_name: String,
    },
    RefreshData,
    CancelBuild,
    OpenScenario {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
    OpenRunLog {
        name: String,
    },
    WatchLiveLog {
        name: String,
    },
    OpenFeatureArtifact {
        name: String,
    },
    CreateScenario {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
    },
    CreateGroup,
    CreateParameterFile,
    OpenSettings,
}

impl OutboundMessage {
    pub const fn command(&self) -> &'static str {
        match self {
            Self::ApplyChanges(_) => "applyChanges",
            Self::RunScenarioInVanessa { .. } => "runScenarioInVanessa",
            Self::RunScenarioManualInVanessa { .. } => "runScenarioManualInVanessa",
            Self::DebugScenarioInVanessa { .. } => "debugScenarioInVanessa",
            Self::AddFavorite(_) => "addFavorite",
            Self::RemoveFavorite { .. } => "removeFavorite",
            Self::SetFavoritesSortMode { .. } => "setFavoritesSortMode",
            Self::RenameGroup { .. } => "renameGroup",
            Self::RefreshData => "refreshData",
            Self::CancelBuild => "cancelBuild",
            Self::OpenScenario { .. } => "openScenario",
            Self::OpenRunLog { .. } => "openRunLog",
            Self::WatchLiveLog { .. } => "watchLiveLog",
            Self::OpenFeatureArtifact { .. } => "openFeatureArtifact",
            Self::CreateScenario { .. } => "createScenario",
            Self::CreateGroup => "createGroup",
            Self::CreateParameterFile => "createParameterFile",
            Self::OpenSettings => "openSettings",
        }
    }
}

/// Flavor of run trigger offered on a scenario row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunTrigger {
    #[default]
    Automatic,
    Manual,
    Debug,
}

impl RunTrigger {
    #[must_use]
    pub fn message(self, name: &str) -> OutboundMessage {
        let name = name.to_string();
        match self {
            Self::Automatic => OutboundMessage::RunScenarioInVanessa { name },
            Self::Manual => OutboundMessage::RunScenarioManualInVanessa { name },
            Self::Debug => OutboundMessage::DebugScenarioInVanessa { name },
        }
    }
}

/// Transport seam to the host. Delivery is fire-and-forget: a failed post is
/// never retried, the next inbound snapshot corrects any divergence.
pub trait HostChannel {
    type Error: std::fmt::Display;

    fn post_message(&mut self, message: &OutboundMessage) -> Result<(), Self::Error>;
}

/// Posts every message, logging and dropping failures. Returns how many were
/// accepted by the channel.
pub fn flush_outbound<C>(channel: &mut C, messages: Vec<OutboundMessage>) -> usize
where
    C: HostChannel,
{
    let mut delivered = 0;
    for message in messages {
        match channel.post_message(&message) {
            Ok(()) => delivered += 1,
            Err(error) => {
                tracing::warn!(command = message.command(), %error, "failed to post message to host");
            }
        }
    }
    delivered
}

pub fn encode_outbound_message(message: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::from)
}

pub fn parse_inbound_message(raw: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(raw)?;
    inbound_message_from_value(&value)
}

pub fn inbound_message_from_value(value: &Value) -> Result<InboundMessage, ProtocolError> {
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;
    let command = object
        .get("command")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .ok_or(ProtocolError::MissingCommand)?;

    let message = match command {
        "loadInitialState" => InboundMessage::LoadInitialState(Box::new(initial_state(object))),
        "updateRunArtifactsState" => InboundMessage::UpdateRunArtifactsState {
            run_artifacts: run_artifacts(object.get("runArtifacts")),
        },
        "updateFavoritesState" => InboundMessage::UpdateFavoritesState {
            favorites: lenient_list(object.get("favorites"), "favorite"),
            sort_mode: sort_mode_field(object, "sortMode"),
        },
        "updateAffectedMainScenarios" => InboundMessage::UpdateAffectedMainScenarios {
            scenarios: string_list(object.get("scenarios")),
        },
        "updateStatus" => InboundMessage::UpdateStatus {
            text: object
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            enable_controls: object.get("enableControls").and_then(Value::as_bool),
            refresh_button_enabled: object.get("refreshButtonEnabled").and_then(Value::as_bool),
        },
        "setRefreshButtonState" => InboundMessage::SetRefreshButtonState {
            enabled: required_bool(object, command, &["enabled"])?,
        },
        "buildStateChanged" => InboundMessage::BuildStateChanged {
            in_progress: required_bool(object, command, &["inProgress", "buildInProgress"])?,
            feature_flags: object
                .get("featureFlags")
                .filter(|value| !value.is_null())
                .map(feature_flags),
        },
        other => InboundMessage::Unknown {
            command: other.to_string(),
        },
    };
    Ok(message)
}

fn initial_state(object: &Map<String, Value>) -> InitialState {
    let error = object
        .get("error")
        .and_then(Value::as_str)
        .filter(|error| !error.trim().is_empty())
        .map(ToString::to_string);

    InitialState {
        error,
        groups: group_snapshots(object.get("groups")),
        run_artifacts: run_artifacts(object.get("runArtifacts")).unwrap_or_default(),
        favorites: lenient_list(object.get("favorites"), "favorite"),
        favorites_sort_mode: sort_mode_field(object, "favoritesSortMode"),
        build_in_progress: object
            .get("buildInProgress")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        feature_flags: object
            .get("featureFlags")
            .map(feature_flags)
            .unwrap_or_default(),
        affected_main_scenarios: string_list(object.get("affectedMainScenarios")),
    }
}

fn group_snapshots(value: Option<&Value>) -> Vec<GroupSnapshot> {
    let Some(groups) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(|group| {
            let Some(name) = group.get("name").and_then(Value::as_str) else {
                tracing::warn!("skipping scenario group without a string name");
                return None;
            };
            Some(GroupSnapshot {
                name: name.to_string(),
                scenarios: lenient_list::<ScenarioSnapshot>(group.get("scenarios"), "scenario"),
            })
        })
        .collect()
}

fn run_artifacts(value: Option<&Value>) -> Option<BTreeMap<String, RunRecordPayload>> {
    let object = value?.as_object()?;
    let mut records = BTreeMap::new();
    for (name, record) in object {
        match serde_json::from_value::<RunRecordPayload>(record.clone()) {
            Ok(record) => {
                records.insert(name.clone(), record);
            }
            Err(error) => {
                tracing::warn!(scenario = %name, %error, "skipping malformed run record");
            }
        }
    }
    Some(records)
}

fn feature_flags(value: &Value) -> FeatureFlags {
    serde_json::from_value(value.clone()).unwrap_or_else(|error| {
        tracing::warn!(%error, "malformed feature flags; treating every feature as disabled");
        FeatureFlags::default()
    })
}

fn sort_mode_field(object: &Map<String, Value>, key: &str) -> Option<SortMode> {
    let raw = object.get(key)?.as_str()?;
    let parsed = parse_sort_mode(raw);
    if parsed.is_none() {
        tracing::warn!(sort_mode = %raw, "ignoring unknown favorites sort mode");
    }
    parsed
}

fn lenient_list<T>(value: Option<&Value>, kind: &'static str) -> Vec<T>
where
    T: DeserializeOwned,
{
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                tracing::warn!(kind, %error, "skipping malformed entry");
                None
            }
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn required_bool(
    object: &Map<String, Value>,
    command: &str,
    keys: &[&str],
) -> Result<bool, ProtocolError> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_bool))
        .ok_or_else(|| ProtocolError::MalformedPayload {
            command: command.to_string(),
            reason: format!("missing boolean `{}`", keys.join("` or `")),
        })
}
