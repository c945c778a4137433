//! Baseline / pending / change-set bookkeeping for scenario toggles.
//!
//! The host owns the baseline. Every user edit lands in the pending map, and
//! the change-set is always derived from the two on demand so that a redraw at
//! any point observes a consistent picture.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Host-confirmed state of a single scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineEntry {
    Enabled,
    Removed,
    DisabledByPolicy,
}

impl BaselineEntry {
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    #[must_use]
    pub const fn is_toggleable(self) -> bool {
        !matches!(self, Self::DisabledByPolicy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSnapshot {
    pub name: String,
    pub state: BaselineEntry,
    #[serde(default)]
    pub default_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub name: String,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSnapshot>,
}

/// Per-scenario attributes that ride along with the baseline but take no part
/// in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioMeta {
    pub group: String,
    pub uri: Option<String>,
    pub scenario_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub groups: usize,
    pub scenarios: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub changed: usize,
    pub enabled: usize,
    pub disabled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changed: BTreeSet<String>,
    pub counts: ChangeCounts,
}

impl ChangeSet {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyChangesPayload {
    pub states: BTreeMap<String, bool>,
    pub changed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioStateStore {
    baseline: BTreeMap<String, BaselineEntry>,
    pending: BTreeMap<String, bool>,
    defaults: BTreeMap<String, bool>,
    meta: BTreeMap<String, ScenarioMeta>,
    groups: BTreeMap<String, Vec<String>>,
}

impl ScenarioStateStore {
    /// Replaces every layer with the host snapshot. Entries that are not
    /// usable (blank names, duplicates) are skipped and reported.
    pub fn load_baseline(&mut self, snapshot: Vec<GroupSnapshot>) -> LoadReport {
        self.clear();
        let mut report = LoadReport::default();

        for group in snapshot {
            let group_name = group.name.trim().to_string();
            if group_name.is_empty() {
                tracing::warn!(
                    scenarios = group.scenarios.len(),
                    "skipping scenario group without a name"
                );
                report.skipped = report.skipped.saturating_add(group.scenarios.len().max(1));
                continue;
            }
            // Groups without members are still shown and can be renamed.
            self.groups.entry(group_name.clone()).or_default();

            for scenario in group.scenarios {
                let name = scenario.name.trim().to_string();
                if name.is_empty() {
                    tracing::warn!(group = %group_name, "skipping scenario without a name");
                    report.skipped = report.skipped.saturating_add(1);
                    continue;
                }
                if self.baseline.contains_key(&name) {
                    tracing::warn!(scenario = %name, group = %group_name, "skipping duplicate scenario");
                    report.skipped = report.skipped.saturating_add(1);
                    continue;
                }

                self.baseline.insert(name.clone(), scenario.state);
                if scenario.state.is_toggleable() {
                    self.pending
                        .insert(name.clone(), scenario.state.is_enabled());
                }
                self.defaults.insert(name.clone(), scenario.default_enabled);
                self.meta.insert(
                    name.clone(),
                    ScenarioMeta {
                        group: group_name.clone(),
                        uri: scenario.uri.filter(|uri| !uri.trim().is_empty()),
                        scenario_code: scenario.scenario_code,
                    },
                );
                self.groups.entry(group_name.clone()).or_default().push(name);
                report.scenarios = report.scenarios.saturating_add(1);
            }
        }

        report.groups = self.groups.len();
        report
    }

    pub fn clear(&mut self) {
        self.baseline.clear();
        self.pending.clear();
        self.defaults.clear();
        self.meta.clear();
        self.groups.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }

    #[must_use]
    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    #[must_use]
    pub fn baseline(&self, name: &str) -> Option<BaselineEntry> {
        self.baseline.get(name).copied()
    }

    #[must_use]
    pub fn pending(&self, name: &str) -> Option<bool> {
        self.pending.get(name).copied()
    }

    #[must_use]
    pub fn meta(&self, name: &str) -> Option<&ScenarioMeta> {
        self.meta.get(name)
    }

    #[must_use]
    pub fn is_toggleable(&self, name: &str) -> bool {
        self.baseline(name)
            .is_some_and(BaselineEntry::is_toggleable)
    }

    #[must_use]
    pub fn is_changed(&self, name: &str) -> bool {
        match (self.baseline(name), self.pending(name)) {
            (Some(baseline), Some(pending)) => baseline.is_enabled() != pending,
            _ => false,
        }
    }

    /// Group names in display order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    #[must_use]
    pub fn group_members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Returns `false` when the scenario is unknown or locked by policy.
    pub fn set_scenario(&mut self, name: &str, enabled: bool) -> bool {
        match self.baseline(name) {
            None => {
                tracing::debug!(scenario = %name, "ignoring toggle for unknown scenario");
                false
            }
            Some(BaselineEntry::DisabledByPolicy) => {
                tracing::debug!(scenario = %name, "ignoring toggle for policy-disabled scenario");
                false
            }
            Some(_) => {
                self.pending.insert(name.to_string(), enabled);
                true
            }
        }
    }

    /// Applies `target` (or the asymmetric default) to every toggleable member
    /// of `group`. Returns the value applied, or `None` if nothing was touched.
    pub fn toggle_group(&mut self, group: &str, target: Option<bool>) -> Option<bool> {
        let Some(members) = self.groups.get(group) else {
            tracing::debug!(group = %group, "ignoring toggle for unknown group");
            return None;
        };
        let members = members
            .iter()
            .filter(|name| self.pending.contains_key(name.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        self.apply_bulk(&members, target)
    }

    pub fn select_all(&mut self) -> Option<bool> {
        let members = self.pending.keys().cloned().collect::<Vec<_>>();
        self.apply_bulk(&members, None)
    }

    pub fn select_defaults(&mut self) {
        for (name, enabled) in &mut self.pending {
            *enabled = self.defaults.get(name).copied().unwrap_or(false);
        }
    }

    #[must_use]
    pub fn diff(&self) -> ChangeSet {
        let mut change_set = ChangeSet::default();
        for (name, &pending) in &self.pending {
            if !self.is_changed(name) {
                continue;
            }
            if pending {
                change_set.counts.enabled += 1;
            } else {
                change_set.counts.disabled += 1;
            }
            change_set.changed.insert(name.clone());
        }
        change_set.counts.changed = change_set.changed.len();
        change_set
    }

    /// Packages the pending layer for the host. The baseline is untouched until
    /// the host answers with a fresh snapshot.
    #[must_use]
    pub fn commit(&self) -> ApplyChangesPayload {
        ApplyChangesPayload {
            states: self.pending.clone(),
            changed: self.diff().changed.into_iter().collect(),
        }
    }

    fn apply_bulk(&mut self, members: &[String], target: Option<bool>) -> Option<bool> {
        if members.is_empty() {
            return None;
        }
        let target = target.unwrap_or_else(|| {
            !members
                .iter()
                .all(|name| self.pending.get(name).copied().unwrap_or(false))
        });
        for name in members {
            if let Some(value) = self.pending.get_mut(name) {
                *value = target;
            }
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(name: &str, state: BaselineEntry) -> ScenarioSnapshot {
        ScenarioSnapshot {
            name: name.to_string(),
            state,
            default_enabled: false,
            uri: None,
            scenario_code: None,
        }
    }

    fn group(name: &str, scenarios: Vec<ScenarioSnapshot>) -> GroupSnapshot {
        GroupSnapshot {
            name: name.to_string(),
            scenarios,
        }
    }

    fn store_with(groups: Vec<GroupSnapshot>) -> ScenarioStateStore {
        let mut store = ScenarioStateStore::default();
        store.load_baseline(groups);
        store
    }

    #[test]
    fn load_baseline_seeds_pending_for_toggleable_scenarios_only() {
        let store = store_with(vec![group(
            "Sales",
            vec![
                scenario("Order", BaselineEntry::Enabled),
                scenario("Invoice", BaselineEntry::Removed),
                scenario("Locked", BaselineEntry::DisabledByPolicy),
            ],
        )]);

        assert_eq!(store.pending("Order"), Some(true));
        assert_eq!(store.pending("Invoice"), Some(false));
        assert_eq!(store.pending("Locked"), None);
        assert_eq!(store.baseline("Locked"), Some(BaselineEntry::DisabledByPolicy));
    }

    #[test]
    fn load_baseline_skips_blank_and_duplicate_entries() {
        let mut store = ScenarioStateStore::default();
        let report = store.load_baseline(vec![
            group(
                "Sales",
                vec![
                    scenario("Order", BaselineEntry::Enabled),
                    scenario("  ", BaselineEntry::Enabled),
                    scenario("Order", BaselineEntry::Removed),
                ],
            ),
            group("", vec![scenario("Orphan", BaselineEntry::Enabled)]),
        ]);

        assert_eq!(report.scenarios, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.groups, 1);
        assert_eq!(store.pending("Order"), Some(true));
        assert_eq!(store.baseline("Orphan"), None);
    }

    #[test]
    fn set_scenario_ignores_policy_disabled_and_unknown_names() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("Order", BaselineEntry::Enabled),
                scenario("Locked", BaselineEntry::DisabledByPolicy),
            ],
        )]);

        assert!(!store.set_scenario("Locked", true));
        assert!(!store.set_scenario("Missing", true));
        assert_eq!(store.pending("Locked"), None);
        assert!(store.set_scenario("Order", false));
        assert_eq!(store.pending("Order"), Some(false));
    }

    #[test]
    fn toggle_group_is_asymmetric() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("B", BaselineEntry::Removed),
            ],
        )]);

        assert_eq!(store.toggle_group("Sales", None), Some(true));
        assert_eq!(store.pending("A"), Some(true));
        assert_eq!(store.pending("B"), Some(true));

        assert_eq!(store.toggle_group("Sales", None), Some(false));
        assert_eq!(store.pending("A"), Some(false));
        assert_eq!(store.pending("B"), Some(false));
    }

    #[test]
    fn toggle_group_skips_policy_members_and_honors_explicit_target() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("Locked", BaselineEntry::DisabledByPolicy),
            ],
        )]);

        // Locked is not counted, so the group is already fully enabled.
        assert_eq!(store.toggle_group("Sales", None), Some(false));
        assert_eq!(store.toggle_group("Sales", Some(true)), Some(true));
        assert_eq!(store.pending("Locked"), None);
        assert_eq!(store.toggle_group("Unknown", None), None);
    }

    #[test]
    fn toggle_group_without_toggleable_members_is_noop() {
        let mut store = store_with(vec![group(
            "Locked",
            vec![scenario("L", BaselineEntry::DisabledByPolicy)],
        )]);
        assert_eq!(store.toggle_group("Locked", None), None);
    }

    #[test]
    fn select_all_applies_rule_globally() {
        let mut store = store_with(vec![
            group("A", vec![scenario("A1", BaselineEntry::Enabled)]),
            group("B", vec![scenario("B1", BaselineEntry::Removed)]),
        ]);

        assert_eq!(store.select_all(), Some(true));
        assert_eq!(
            store.diff().counts,
            ChangeCounts {
                changed: 1,
                enabled: 1,
                disabled: 0,
            }
        );
        assert_eq!(store.select_all(), Some(false));
        assert_eq!(
            store.diff().counts,
            ChangeCounts {
                changed: 1,
                enabled: 0,
                disabled: 1,
            }
        );
    }

    #[test]
    fn select_defaults_uses_default_flags_not_baseline() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                ScenarioSnapshot {
                    default_enabled: true,
                    ..scenario("A", BaselineEntry::Removed)
                },
                scenario("B", BaselineEntry::Enabled),
            ],
        )]);

        store.select_defaults();
        assert_eq!(store.pending("A"), Some(true));
        assert_eq!(store.pending("B"), Some(false));
        assert_eq!(
            store.diff().counts,
            ChangeCounts {
                changed: 2,
                enabled: 1,
                disabled: 1,
            }
        );
    }

    #[test]
    fn change_counts_split_changed_rows_by_direction() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("B", BaselineEntry::Enabled),
                scenario("C", BaselineEntry::Removed),
                scenario("D", BaselineEntry::Removed),
            ],
        )]);
        store.set_scenario("C", true);
        assert_eq!(
            store.diff().counts,
            ChangeCounts {
                changed: 1,
                enabled: 1,
                disabled: 0,
            }
        );

        store.set_scenario("A", false);
        let counts = store.diff().counts;
        assert_eq!(counts.changed, counts.enabled + counts.disabled);
        assert_eq!(counts.disabled, 1);
    }

    #[test]
    fn empty_groups_are_kept() {
        let mut store = ScenarioStateStore::default();
        let report = store.load_baseline(vec![
            group("Fresh", Vec::new()),
            group("Sales", vec![scenario("A", BaselineEntry::Enabled)]),
        ]);

        assert_eq!(report.groups, 2);
        assert!(store.has_groups());
        assert!(store.has_group("Fresh"));
        assert_eq!(store.group_members("Fresh"), Some(&[][..]));
        assert_eq!(store.toggle_group("Fresh", None), None);
    }

    #[test]
    fn diff_is_idempotent_and_counts_only_changed_rows() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("B", BaselineEntry::Removed),
                scenario("C", BaselineEntry::DisabledByPolicy),
            ],
        )]);
        store.set_scenario("B", true);

        let first = store.diff();
        let second = store.diff();
        assert_eq!(first, second);
        assert_eq!(
            first.counts,
            ChangeCounts {
                changed: 1,
                enabled: 1,
                disabled: 0,
            }
        );
        assert!(first.contains("B"));
    }

    #[test]
    fn commit_excludes_policy_scenarios_and_keeps_baseline() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("Locked", BaselineEntry::DisabledByPolicy),
            ],
        )]);
        store.set_scenario("A", false);

        let payload = store.commit();
        assert_eq!(payload.states.get("A"), Some(&false));
        assert!(!payload.states.contains_key("Locked"));
        assert_eq!(payload.changed, vec!["A".to_string()]);
        assert_eq!(store.baseline("A"), Some(BaselineEntry::Enabled));
    }

    #[test]
    fn reloading_snapshot_drops_omitted_scenarios_entirely() {
        let mut store = store_with(vec![group(
            "Sales",
            vec![
                scenario("A", BaselineEntry::Enabled),
                scenario("B", BaselineEntry::Removed),
            ],
        )]);
        store.set_scenario("B", true);

        store.load_baseline(vec![group(
            "Sales",
            vec![scenario("A", BaselineEntry::Enabled)],
        )]);

        assert_eq!(store.baseline("B"), None);
        assert_eq!(store.pending("B"), None);
        let diff = store.diff();
        assert!(diff.is_empty());
        assert_eq!(diff.counts, ChangeCounts::default());
        assert_eq!(store.group_members("Sales"), Some(&["A".to_string()][..]));
    }
}
