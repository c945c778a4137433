use std::collections::BTreeMap;

use serde::Serialize;

use crate::scenario_state::{ChangeSet, ScenarioStateStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub expanded: bool,
    pub enabled_count: usize,
    pub total_count: usize,
    pub has_change: bool,
}

/// Expand/collapse flags keyed by group name so that they survive redraws and
/// snapshot reloads.
#[derive(Debug, Clone, Default)]
pub struct GroupExpansion {
    expanded: BTreeMap<String, bool>,
}

impl GroupExpansion {
    /// Keeps flags for groups that still exist, collapses new ones, forgets
    /// vanished ones.
    pub fn reconcile<'a>(&mut self, groups: impl IntoIterator<Item = &'a str>) {
        let mut next = BTreeMap::new();
        for group in groups {
            let expanded = self.expanded.get(group).copied().unwrap_or(false);
            next.insert(group.to_string(), expanded);
        }
        self.expanded = next;
    }

    #[must_use]
    pub fn is_expanded(&self, group: &str) -> bool {
        self.expanded.get(group).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, group: &str, expanded: bool) -> bool {
        let Some(flag) = self.expanded.get_mut(group) else {
            return false;
        };
        *flag = expanded;
        true
    }

    pub fn toggle(&mut self, group: &str) -> Option<bool> {
        let flag = self.expanded.get_mut(group)?;
        *flag = !*flag;
        Some(*flag)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.values_mut().for_each(|flag| *flag = false);
    }

    pub fn expand_all(&mut self) {
        self.expanded.values_mut().for_each(|flag| *flag = true);
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

#[must_use]
pub fn summarize_group(
    store: &ScenarioStateStore,
    change_set: &ChangeSet,
    expansion: &GroupExpansion,
    group: &str,
) -> Option<GroupSummary> {
    let members = store.group_members(group)?;
    let mut summary = GroupSummary {
        name: group.to_string(),
        expanded: expansion.is_expanded(group),
        enabled_count: 0,
        total_count: 0,
        has_change: false,
    };
    for member in members {
        let Some(pending) = store.pending(member) else {
            continue;
        };
        summary.total_count += 1;
        if pending {
            summary.enabled_count += 1;
        }
        if change_set.contains(member) {
            summary.has_change = true;
        }
    }
    Some(summary)
}

/// One summary per group, in display order.
#[must_use]
pub fn aggregate_groups(
    store: &ScenarioStateStore,
    change_set: &ChangeSet,
    expansion: &GroupExpansion,
) -> Vec<GroupSummary> {
    store
        .group_names()
        .filter_map(|group| summarize_group(store, change_set, expansion, group))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario_state::{BaselineEntry, GroupSnapshot, ScenarioSnapshot};

    fn snapshot(groups: &[(&str, &[(&str, BaselineEntry)])]) -> Vec<GroupSnapshot> {
        groups
            .iter()
            .map(|(group, scenarios)| GroupSnapshot {
                name: (*group).to_string(),
                scenarios: scenarios
                    .iter()
                    .map(|(name, state)| ScenarioSnapshot {
                        name: (*name).to_string(),
                        state: *state,
                        default_enabled: false,
                        uri: None,
                        scenario_code: None,
                    })
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn summaries_count_only_toggleable_members() {
        let mut store = ScenarioStateStore::default();
        store.load_baseline(snapshot(&[(
            "Sales",
            &[
                ("A", BaselineEntry::Enabled),
                ("B", BaselineEntry::Removed),
                ("Locked", BaselineEntry::DisabledByPolicy),
            ],
        )]));
        let mut expansion = GroupExpansion::default();
        expansion.reconcile(store.group_names());

        let groups = aggregate_groups(&store, &store.diff(), &expansion);
        assert_eq!(
            groups,
            vec![GroupSummary {
                name: "Sales".to_string(),
                expanded: false,
                enabled_count: 1,
                total_count: 2,
                has_change: false,
            }]
        );

        store.set_scenario("B", true);
        let groups = aggregate_groups(&store, &store.diff(), &expansion);
        assert_eq!(groups[0].enabled_count, 2);
        assert!(groups[0].has_change);
    }

    #[test]
    fn groups_are_sorted_and_members_keep_source_order() {
        let mut store = ScenarioStateStore::default();
        store.load_baseline(snapshot(&[
            ("Zeta", &[("Z2", BaselineEntry::Enabled), ("Z1", BaselineEntry::Enabled)]),
            ("Alpha", &[("A1", BaselineEntry::Enabled)]),
        ]));

        let names = store.group_names().collect::<Vec<_>>();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(
            store.group_members("Zeta"),
            Some(&["Z2".to_string(), "Z1".to_string()][..])
        );
    }

    #[test]
    fn expansion_survives_reconcile_by_name() {
        let mut expansion = GroupExpansion::default();
        expansion.reconcile(["Alpha", "Beta"]);
        assert!(expansion.set_expanded("Beta", true));

        expansion.reconcile(["Beta", "Gamma"]);
        assert!(expansion.is_expanded("Beta"));
        assert!(!expansion.is_expanded("Gamma"));
        assert!(!expansion.is_expanded("Alpha"));
        assert!(!expansion.set_expanded("Alpha", true));
    }

    #[test]
    fn collapse_all_and_toggle() {
        let mut expansion = GroupExpansion::default();
        expansion.reconcile(["Alpha", "Beta"]);
        assert_eq!(expansion.toggle("Alpha"), Some(true));
        expansion.expand_all();
        assert!(expansion.is_expanded("Beta"));
        expansion.collapse_all();
        assert!(!expansion.is_expanded("Alpha"));
        assert!(!expansion.is_expanded("Beta"));
        assert_eq!(expansion.toggle("Missing"), None);
    }
}
