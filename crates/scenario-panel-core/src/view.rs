//! Read-only projections handed to the rendering layer after every change.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::favorites::{FavoriteEntry, SortMode};
use crate::groups::GroupSummary;
use crate::run_status::RunBadge;
use crate::scenario_state::ChangeCounts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRowView {
    pub name: String,
    pub group: String,
    pub checked: bool,
    pub disabled: bool,
    pub policy_locked: bool,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_badge: Option<RunBadge>,
    pub run_enabled: bool,
    pub affected: bool,
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub scenarios: Vec<ScenarioRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub build_in_progress: bool,
    pub groups: Vec<GroupView>,
    pub counts: ChangeCounts,
    pub controls: BTreeMap<&'static str, bool>,
    pub favorites: Vec<FavoriteEntry>,
    pub favorites_sort_mode: SortMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_overlay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl PanelView {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioRowView> {
        self.groups
            .iter()
            .flat_map(|group| group.scenarios.iter())
            .find(|row| row.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupView> {
        self.groups.iter().find(|group| group.summary.name == name)
    }

    #[must_use]
    pub fn control(&self, name: &str) -> bool {
        self.controls.get(name).copied().unwrap_or(false)
    }
}
