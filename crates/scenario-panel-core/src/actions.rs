//! User-action entry points accepted from the rendering layer.

use serde::{Deserialize, Serialize};

use crate::control_gate::ControlClass;
use crate::error::ActionError;
use crate::favorites::SortMode;
use crate::protocol::RunTrigger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum UserAction {
    SetScenario {
        name: String,
        enabled: bool,
    },
    ToggleGroup {
        group: String,
        #[serde(default)]
        target: Option<bool>,
    },
    SelectAll,
    SelectDefaults,
    ApplyChanges,
    RunScenario {
        name: String,
        #[serde(default)]
        trigger: RunTrigger,
    },
    ToggleGroupExpanded {
        group: String,
    },
    CollapseAll,
    ExpandAll,
    AddFavorite {
        name: String,
    },
    RemoveFavorite {
        uri: String,
    },
    SetSortMode {
        sort_mode: SortMode,
    },
    RenameGroup {
        group: String,
        new_name: String,
    },
    Refresh,
    CancelBuild,
    OpenScenario {
        name: String,
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
        #[serde(default)]
        group: Option<String>,
    },
    CreateGroup,
    CreateParameterFile,
    OpenSettings,
    ToggleOverlay {
        id: String,
    },
    OutsideClick {
        #[serde(default)]
        inside: Option<String>,
    },
}

impl UserAction {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SetScenario { .. } => "setScenario",
            Self::ToggleGroup { .. } => "toggleGroup",
            Self::SelectAll => "selectAll",
            Self::SelectDefaults => "selectDefaults",
            Self::ApplyChanges => "applyChanges",
            Self::RunScenario { .. } => "runScenario",
            Self::ToggleGroupExpanded { .. } => "toggleGroupExpanded",
            Self::CollapseAll => "collapseAll",
            Self::ExpandAll => "expandAll",
            Self::AddFavorite { .. } => "addFavorite",
            Self::RemoveFavorite { .. } => "removeFavorite",
            Self::SetSortMode { .. } => "setSortMode",
            Self::RenameGroup { .. } => "renameGroup",
            Self::Refresh => "refresh",
            Self::CancelBuild => "cancelBuild",
            Self::OpenScenario { .. } => "openScenario",
            Self::OpenRunLog { .. } => "openRunLog",
            Self::WatchLiveLog { .. } => "watchLiveLog",
            Self::OpenFeatureArtifact { .. } => "openFeatureArtifact",
            Self::CreateScenario { .. } => "createScenario",
            Self::CreateGroup => "createGroup",
            Self::CreateParameterFile => "createParameterFile",
            Self::OpenSettings => "openSettings",
            Self::ToggleOverlay { .. } => "toggleOverlay",
            Self::OutsideClick { .. } => "outsideClick",
        }
    }
}

/// Why an action was dropped without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    ControlDisabled(ControlClass),
    PolicyLocked,
    UnknownTarget,
    AlreadyRunning,
    ArtifactUnavailable,
    NothingToDo,
}

impl IgnoreReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ControlDisabled(_) => "control disabled",
            Self::PolicyLocked => "locked by policy",
            Self::UnknownTarget => "unknown target",
            Self::AlreadyRunning => "already running",
            Self::ArtifactUnavailable => "artifact unavailable",
            Self::NothingToDo => "nothing to do",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Ignored(IgnoreReason),
    Rejected(ActionError),
}

impl ActionOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl From<Result<(), IgnoreReason>> for ActionOutcome {
    fn from(result: Result<(), IgnoreReason>) -> Self {
        match result {
            Ok(()) => Self::Applied,
            Err(reason) => Self::Ignored(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: UserAction =
            serde_json::from_str(r#"{"action":"runScenario","name":"Checkout"}"#).expect("action");
        assert_eq!(
            action,
            UserAction::RunScenario {
                name: "Checkout".to_string(),
                trigger: RunTrigger::Automatic,
            }
        );

        let action: UserAction = serde_json::from_str(
            r#"{"action":"renameGroup","group":"Sales","newName":"Orders"}"#,
        )
        .expect("action");
        assert_eq!(action.label(), "renameGroup");

        let action: UserAction =
            serde_json::from_str(r#"{"action":"setSortMode","sortMode":"by-name"}"#)
                .expect("action");
        assert_eq!(
            action,
            UserAction::SetSortMode {
                sort_mode: SortMode::ByName
            }
        );
    }

    #[test]
    fn ignore_result_converts_to_outcome() {
        assert!(ActionOutcome::from(Ok(())).is_applied());
        assert_eq!(
            ActionOutcome::from(Err(IgnoreReason::AlreadyRunning)),
            ActionOutcome::Ignored(IgnoreReason::AlreadyRunning)
        );
        assert_eq!(IgnoreReason::PolicyLocked.label(), "locked by policy");
    }
}
