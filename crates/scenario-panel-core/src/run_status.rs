//! Per-scenario run lifecycle as last reported by the host.
//!
//! Records are only ever replaced wholesale. Nothing in here advances a run on
//! its own; a trigger sent to the host shows up as `running` once the host says so.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Passed,
    Failed,
}

impl RunStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Run status with the staleness flag folded in. `Idle` has nothing to be
/// stale about, so the flag only exists on the other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running { stale: bool },
    Passed { stale: bool },
    Failed { stale: bool },
}

impl RunState {
    #[must_use]
    pub const fn from_parts(status: RunStatus, stale: bool) -> Self {
        match status {
            RunStatus::Idle => Self::Idle,
            RunStatus::Running => Self::Running { stale },
            RunStatus::Passed => Self::Passed { stale },
            RunStatus::Failed => Self::Failed { stale },
        }
    }

    #[must_use]
    pub const fn status(self) -> RunStatus {
        match self {
            Self::Idle => RunStatus::Idle,
            Self::Running { .. } => RunStatus::Running,
            Self::Passed { .. } => RunStatus::Passed,
            Self::Failed { .. } => RunStatus::Failed,
        }
    }

    #[must_use]
    pub const fn is_stale(self) -> bool {
        match self {
            Self::Idle => false,
            Self::Running { stale } | Self::Passed { stale } | Self::Failed { stale } => stale,
        }
    }

    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAvailability {
    pub feature: bool,
    pub log: bool,
    pub live_log: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunRecord {
    pub state: RunState,
    pub message: Option<String>,
    pub artifacts: ArtifactAvailability,
}

/// Wire shape of a run record as pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecordPayload {
    #[serde(default)]
    pub run_status: RunStatus,
    #[serde(default)]
    pub stale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub has_feature_artifact: bool,
    #[serde(default)]
    pub has_log_artifact: bool,
    #[serde(default)]
    pub can_watch_live_log: bool,
}

impl From<RunRecordPayload> for RunRecord {
    fn from(payload: RunRecordPayload) -> Self {
        if payload.stale && payload.run_status == RunStatus::Idle {
            tracing::debug!("host reported a stale idle run record; stale flag has no effect");
        }
        Self {
            state: RunState::from_parts(payload.run_status, payload.stale),
            message: payload
                .message
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty()),
            artifacts: ArtifactAvailability {
                feature: payload.has_feature_artifact,
                log: payload.has_log_artifact,
                live_log: payload.can_watch_live_log,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBadge {
    pub status: RunStatus,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub artifacts: ArtifactAvailability,
}

impl RunBadge {
    pub fn label(&self) -> String {
        if self.stale {
            format!("{} (stale)", self.status.label())
        } else {
            self.status.label().to_string()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStatusMachine {
    records: BTreeMap<String, RunRecord>,
}

impl RunStatusMachine {
    pub fn replace_all(&mut self, records: BTreeMap<String, RunRecord>) {
        self.records = records;
    }

    /// Host signalled that no run artifacts exist any more.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<&RunRecord> {
        self.records.get(name)
    }

    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.records
            .get(name)
            .is_some_and(|record| record.state.is_running())
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.state.is_running())
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn badge(&self, name: &str) -> Option<RunBadge> {
        let record = self.records.get(name)?;
        Some(RunBadge {
            status: record.state.status(),
            stale: record.state.is_stale(),
            message: record.message.clone(),
            artifacts: record.artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: RunStatus, stale: bool) -> RunRecord {
        RunRecordPayload {
            run_status: status,
            stale,
            ..RunRecordPayload::default()
        }
        .into()
    }

    fn machine_with(entries: &[(&str, RunRecord)]) -> RunStatusMachine {
        let mut machine = RunStatusMachine::default();
        machine.replace_all(
            entries
                .iter()
                .map(|(name, record)| ((*name).to_string(), record.clone()))
                .collect(),
        );
        machine
    }

    #[test]
    fn stale_flag_never_changes_run_status() {
        let machine = machine_with(&[("A", record(RunStatus::Passed, true))]);
        let badge = machine.badge("A").expect("badge");
        assert_eq!(badge.status, RunStatus::Passed);
        assert!(badge.stale);
        assert_eq!(badge.label(), "passed (stale)");
    }

    #[test]
    fn idle_record_renders_without_stale_suffix() {
        let machine = machine_with(&[("A", record(RunStatus::Idle, true))]);
        let badge = machine.badge("A").expect("badge");
        assert_eq!(badge.status, RunStatus::Idle);
        assert!(!badge.stale);
        assert_eq!(badge.label(), "idle");
    }

    #[test]
    fn running_record_is_reported_per_scenario() {
        let machine = machine_with(&[
            ("A", record(RunStatus::Running, false)),
            ("B", record(RunStatus::Failed, false)),
        ]);
        assert!(machine.is_running("A"));
        assert!(!machine.is_running("B"));
        assert!(!machine.is_running("Unknown"));
        assert_eq!(machine.running_count(), 1);
    }

    #[test]
    fn replace_all_drops_records_missing_from_new_map() {
        let mut machine = machine_with(&[
            ("A", record(RunStatus::Running, false)),
            ("B", record(RunStatus::Passed, false)),
        ]);
        machine.replace_all(BTreeMap::from([(
            "B".to_string(),
            record(RunStatus::Failed, true),
        )]));

        assert!(machine.record("A").is_none());
        assert_eq!(
            machine.record("B").map(|record| record.state),
            Some(RunState::Failed { stale: true })
        );
        machine.clear();
        assert!(machine.is_empty());
    }

    #[test]
    fn payload_maps_artifact_flags_and_trims_message() {
        let record: RunRecord = RunRecordPayload {
            run_status: RunStatus::Failed,
            stale: false,
            message: Some("  step 4 failed ".to_string()),
            has_feature_artifact: true,
            has_log_artifact: true,
            can_watch_live_log: false,
        }
        .into();

        assert_eq!(record.message.as_deref(), Some("step 4 failed"));
        assert_eq!(
            record.artifacts,
            ArtifactAvailability {
                feature: true,
                log: true,
                live_log: false,
            }
        );
    }

    #[test]
    fn payload_deserializes_with_missing_fields() {
        let payload: RunRecordPayload =
            serde_json::from_str(r#"{"runStatus":"running"}"#).expect("payload");
        assert_eq!(payload.run_status, RunStatus::Running);
        assert!(!payload.stale);
        assert!(!payload.has_log_artifact);
    }
}
