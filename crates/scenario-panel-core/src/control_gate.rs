//! Enablement policy for every interactive control on the panel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    #[serde(default)]
    pub switcher_enabled: bool,
    #[serde(default)]
    pub assembler_enabled: bool,
    #[serde(default)]
    pub drive_features_enabled: bool,
    #[serde(default)]
    pub highlight_affected_main_scenarios: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlClass {
    Toggles,
    Apply,
    BulkSelect,
    Create,
    RunTriggers,
    CollapseAll,
    Cancel,
    Refresh,
    Settings,
}

impl ControlClass {
    pub const ALL: [Self; 9] = [
        Self::Toggles,
        Self::Apply,
        Self::BulkSelect,
        Self::Create,
        Self::RunTriggers,
        Self::CollapseAll,
        Self::Cancel,
        Self::Refresh,
        Self::Settings,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Toggles => "toggles",
            Self::Apply => "apply",
            Self::BulkSelect => "bulkSelect",
            Self::Create => "create",
            Self::RunTriggers => "runTriggers",
            Self::CollapseAll => "collapseAll",
            Self::Cancel => "cancel",
            Self::Refresh => "refresh",
            Self::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlEnablement {
    pub toggles: bool,
    pub apply: bool,
    pub bulk_select: bool,
    pub create: bool,
    pub run_triggers: bool,
    pub collapse_all: bool,
    pub cancel: bool,
    pub refresh: bool,
    pub settings: bool,
}

impl ControlEnablement {
    #[must_use]
    pub const fn is_enabled(&self, control: ControlClass) -> bool {
        match control {
            ControlClass::Toggles => self.toggles,
            ControlClass::Apply => self.apply,
            ControlClass::BulkSelect => self.bulk_select,
            ControlClass::Create => self.create,
            ControlClass::RunTriggers => self.run_triggers,
            ControlClass::CollapseAll => self.collapse_all,
            ControlClass::Cancel => self.cancel,
            ControlClass::Refresh => self.refresh,
            ControlClass::Settings => self.settings,
        }
    }

    /// Everything off except the controls that stay reachable no matter what.
    const fn locked(cancel: bool) -> Self {
        Self {
            toggles: false,
            apply: false,
            bulk_select: false,
            create: false,
            run_triggers: false,
            collapse_all: false,
            cancel,
            refresh: false,
            settings: true,
        }
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        ControlClass::ALL
            .into_iter()
            .map(|control| (control.label(), self.is_enabled(control)))
            .collect()
    }
}

/// Pure gate over the global flags.
///
/// A build in progress locks everything but cancel. Otherwise each control is
/// on only when its feature flag is on and, for controls that act on scenario
/// data, when at least one group is loaded.
#[must_use]
pub fn gate(build_in_progress: bool, flags: FeatureFlags, has_groups: bool) -> ControlEnablement {
    if build_in_progress {
        return ControlEnablement::locked(true);
    }

    let switcher = flags.switcher_enabled;
    ControlEnablement {
        toggles: switcher && has_groups,
        apply: switcher && has_groups,
        bulk_select: switcher && has_groups,
        create: flags.drive_features_enabled,
        run_triggers: flags.assembler_enabled,
        collapse_all: has_groups,
        cancel: false,
        refresh: true,
        settings: true,
    }
}

/// Host-driven inputs layered on top of [`gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlGate {
    pub build_in_progress: bool,
    pub flags: FeatureFlags,
    /// `enableControls` from the last status update that carried one.
    pub host_controls_enabled: bool,
    /// Explicit refresh instruction; wins over every other rule for refresh.
    pub refresh_override: Option<bool>,
    /// Set while the host reported a load error.
    pub degraded: bool,
}

impl Default for ControlGate {
    fn default() -> Self {
        Self {
            build_in_progress: false,
            flags: FeatureFlags::default(),
            host_controls_enabled: true,
            refresh_override: None,
            degraded: false,
        }
    }
}

impl ControlGate {
    #[must_use]
    pub fn evaluate(&self, has_groups: bool) -> ControlEnablement {
        let mut enablement = if self.degraded {
            ControlEnablement {
                refresh: true,
                ..ControlEnablement::locked(self.build_in_progress)
            }
        } else if !self.host_controls_enabled {
            ControlEnablement::locked(self.build_in_progress)
        } else {
            gate(self.build_in_progress, self.flags, has_groups)
        };

        if let Some(refresh) = self.refresh_override {
            enablement.refresh = refresh;
        }
        enablement
    }

    /// Run trigger for a single scenario row.
    #[must_use]
    pub fn run_trigger_enabled(enablement: &ControlEnablement, running: bool) -> bool {
        enablement.run_triggers && !running
    }
}
