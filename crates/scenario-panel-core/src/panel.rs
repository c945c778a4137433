//! Panel controller: owns every piece of panel state, applies host messages in
//! arrival order, turns user actions into outbound commands, and projects the
//! result for the renderer.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::actions::{ActionOutcome, IgnoreReason, UserAction};
use crate::affected::AffectedSet;
use crate::config::PanelConfig;
use crate::control_gate::{ControlClass, ControlEnablement, ControlGate};
use crate::error::ActionError;
use crate::favorites::{FavoriteEntry, FavoritesRegistry};
use crate::groups::{GroupExpansion, aggregate_groups};
use crate::overlay::{OverlaySlot, TooltipDebounce};
use crate::protocol::{InboundMessage, InitialState, OutboundMessage, RunTrigger, parse_inbound_message};
use crate::run_status::{RunRecord, RunStatusMachine};
use crate::scenario_state::{BaselineEntry, ChangeSet, ScenarioStateStore};
use crate::view::{GroupView, PanelView, ScenarioRowView};

pub struct ScenarioPanel {
    store: ScenarioStateStore,
    runs: RunStatusMachine,
    expansion: GroupExpansion,
    affected: AffectedSet,
    favorites: FavoritesRegistry,
    gate: ControlGate,
    status_text: Option<String>,
    load_error: Option<String>,
    overlay: OverlaySlot,
    tooltip: TooltipDebounce,
    outbox: Vec<OutboundMessage>,
}

impl Default for ScenarioPanel {
    fn default() -> Self {
        Self::new(&PanelConfig::default())
    }
}

impl ScenarioPanel {
    #[must_use]
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            store: ScenarioStateStore::default(),
            runs: RunStatusMachine::default(),
            expansion: GroupExpansion::default(),
            affected: AffectedSet::default(),
            favorites: FavoritesRegistry::with_sort_mode(config.default_sort_mode),
            gate: ControlGate::default(),
            status_text: None,
            load_error: None,
            overlay: OverlaySlot::default(),
            tooltip: TooltipDebounce::new(config.tooltip_dismiss_delay),
            outbox: Vec::new(),
        }
    }

    pub fn store(&self) -> &ScenarioStateStore {
        &self.store
    }

    pub fn runs(&self) -> &RunStatusMachine {
        &self.runs
    }

    pub fn favorites(&self) -> &FavoritesRegistry {
        &self.favorites
    }

    pub fn gate(&self) -> &ControlGate {
        &self.gate
    }

    pub fn affected(&self) -> &AffectedSet {
        &self.affected
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.gate.degraded
    }

    #[must_use]
    pub fn is_group_expanded(&self, group: &str) -> bool {
        self.expansion.is_expanded(group)
    }

    #[must_use]
    pub fn enablement(&self) -> ControlEnablement {
        self.gate.evaluate(self.store.has_groups())
    }

    #[must_use]
    pub fn change_set(&self) -> ChangeSet {
        self.store.diff()
    }

    /// Outbound commands queued since the last drain, oldest first.
    pub fn pending_outbound(&self) -> &[OutboundMessage] {
        &self.outbox
    }

    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Parses and applies one raw host message. Malformed envelopes are logged
    /// and dropped so that the next message is still processed.
    pub fn handle_raw_message(&mut self, raw: &str) -> bool {
        match parse_inbound_message(raw) {
            Ok(message) => self.handle_message(message),
            Err(error) => {
                tracing::warn!(%error, "dropping malformed host message");
                false
            }
        }
    }

    /// Returns `true` when the message changed anything the renderer shows.
    pub fn handle_message(&mut self, message: InboundMessage) -> bool {
        match message {
            InboundMessage::LoadInitialState(state) => {
                self.apply_initial_state(*state);
                true
            }
            InboundMessage::UpdateRunArtifactsState { run_artifacts } => {
                match run_artifacts {
                    Some(records) => self.runs.replace_all(
                        records
                            .into_iter()
                            .map(|(name, payload)| (name, RunRecord::from(payload)))
                            .collect(),
                    ),
                    None => self.runs.clear(),
                }
                true
            }
            InboundMessage::UpdateFavoritesState {
                favorites,
                sort_mode,
            } => {
                let sort_mode = sort_mode.unwrap_or(self.favorites.sort_mode());
                self.favorites.replace(favorites, sort_mode);
                true
            }
            InboundMessage::UpdateAffectedMainScenarios { scenarios } => {
                self.affected.replace(scenarios);
                true
            }
            InboundMessage::UpdateStatus {
                text,
                enable_controls,
                refresh_button_enabled,
            } => {
                let text = text.trim();
                self.status_text = (!text.is_empty()).then(|| text.to_string());
                if let Some(enabled) = enable_controls {
                    self.gate.host_controls_enabled = enabled;
                }
                if let Some(enabled) = refresh_button_enabled {
                    self.gate.refresh_override = Some(enabled);
                }
                true
            }
            InboundMessage::SetRefreshButtonState { enabled } => {
                self.gate.refresh_override = Some(enabled);
                true
            }
            InboundMessage::BuildStateChanged {
                in_progress,
                feature_flags,
            } => {
                tracing::debug!(in_progress, "build state changed");
                self.gate.build_in_progress = in_progress;
                if let Some(flags) = feature_flags {
                    self.gate.flags = flags;
                }
                true
            }
            InboundMessage::Unknown { command } => {
                tracing::warn!(%command, "ignoring unknown host command");
                false
            }
        }
    }

    fn apply_initial_state(&mut self, state: InitialState) {
        self.gate.build_in_progress = state.build_in_progress;
        self.gate.flags = state.feature_flags;

        if let Some(error) = state.error {
            tracing::warn!(%error, "host reported a load error; entering degraded mode");
            self.store.clear();
            self.expansion.clear();
            self.runs.clear();
            self.affected.clear();
            self.favorites.clear();
            self.overlay.close();
            self.gate.degraded = true;
            self.status_text = Some(error.clone());
            self.load_error = Some(error);
            return;
        }

        if self.load_error.take().is_some() {
            self.status_text = None;
        }
        self.gate.degraded = false;
        // A fresh snapshot supersedes an earlier enableControls=false.
        self.gate.host_controls_enabled = true;

        let report = self.store.load_baseline(state.groups);
        self.expansion.reconcile(self.store.group_names());
        self.runs.replace_all(
            state
                .run_artifacts
                .into_iter()
                .map(|(name, payload)| (name, RunRecord::from(payload)))
                .collect(),
        );
        let sort_mode = state
            .favorites_sort_mode
            .unwrap_or(self.favorites.sort_mode());
        self.favorites.replace(state.favorites, sort_mode);
        self.affected.replace(state.affected_main_scenarios);

        tracing::info!(
            groups = report.groups,
            scenarios = report.scenarios,
            skipped = report.skipped,
            run_records = self.runs.len(),
            favorites = self.favorites.entries().len(),
            "loaded scenario snapshot"
        );
    }

    pub fn dispatch(&mut self, action: UserAction) -> ActionOutcome {
        let label = action.label();
        let outcome = self.run_action(action);
        match &outcome {
            ActionOutcome::Applied => tracing::debug!(action = label, "user action applied"),
            ActionOutcome::Ignored(reason) => {
                tracing::debug!(action = label, reason = reason.label(), "user action ignored");
            }
            ActionOutcome::Rejected(error) => {
                tracing::debug!(action = label, %error, "user action rejected");
            }
        }
        outcome
    }

    fn run_action(&mut self, action: UserAction) -> ActionOutcome {
        match action {
            UserAction::SetScenario { name, enabled } => self.set_scenario(&name, enabled).into(),
            UserAction::ToggleGroup { group, target } => self.toggle_group(&group, target).into(),
            UserAction::SelectAll => self
                .require(ControlClass::BulkSelect)
                .and_then(|()| {
                    self.store
                        .select_all()
                        .map(|_| ())
                        .ok_or(IgnoreReason::NothingToDo)
                })
                .into(),
            UserAction::SelectDefaults => self
                .require(ControlClass::BulkSelect)
                .map(|()| self.store.select_defaults())
                .into(),
            UserAction::ApplyChanges => self.apply_changes().into(),
            UserAction::RunScenario { name, trigger } => self.trigger_run(&name, trigger).into(),
            UserAction::ToggleGroupExpanded { group } => self
                .expansion
                .toggle(&group)
                .map(|_| ())
                .ok_or(IgnoreReason::UnknownTarget)
                .into(),
            UserAction::CollapseAll => self
                .require(ControlClass::CollapseAll)
                .map(|()| self.expansion.collapse_all())
                .into(),
            UserAction::ExpandAll => self
                .require(ControlClass::CollapseAll)
                .map(|()| self.expansion.expand_all())
                .into(),
            UserAction::AddFavorite { name } => self.add_favorite(&name),
            UserAction::RemoveFavorite { uri } => self.remove_favorite(&uri),
            UserAction::SetSortMode { sort_mode } => {
                if !self.favorites.set_sort_mode(sort_mode) {
                    return ActionOutcome::Ignored(IgnoreReason::NothingToDo);
                }
                self.outbox
                    .push(OutboundMessage::SetFavoritesSortMode { sort_mode });
                ActionOutcome::Applied
            }
            UserAction::RenameGroup { group, new_name } => self.rename_group(&group, &new_name),
            UserAction::Refresh => self
                .forward_gated(ControlClass::Refresh, OutboundMessage::RefreshData)
                .into(),
            UserAction::CancelBuild => self
                .forward_gated(ControlClass::Cancel, OutboundMessage::CancelBuild)
                .into(),
            UserAction::OpenScenario { name } => {
                let Some(meta) = self.store.meta(&name) else {
                    return ActionOutcome::Ignored(IgnoreReason::UnknownTarget);
                };
                let uri = meta.uri.clone();
                self.outbox.push(OutboundMessage::OpenScenario { name, uri });
                ActionOutcome::Applied
            }
            UserAction::OpenRunLog { name } => self
                .forward_artifact(&name, |record| record.artifacts.log, |name| {
                    OutboundMessage::OpenRunLog { name }
                })
                .into(),
            UserAction::WatchLiveLog { name } => self
                .forward_artifact(&name, |record| record.artifacts.live_log, |name| {
                    OutboundMessage::WatchLiveLog { name }
                })
                .into(),
            UserAction::OpenFeatureArtifact { name } => self
                .forward_artifact(&name, |record| record.artifacts.feature, |name| {
                    OutboundMessage::OpenFeatureArtifact { name }
                })
                .into(),
            UserAction::CreateScenario { group } => {
                let group = group
                    .map(|group| group.trim().to_string())
                    .filter(|group| !group.is_empty());
                self.forward_gated(ControlClass::Create, OutboundMessage::CreateScenario { group })
                    .into()
            }
            UserAction::CreateGroup => self
                .forward_gated(ControlClass::Create, OutboundMessage::CreateGroup)
                .into(),
            UserAction::CreateParameterFile => self
                .forward_gated(ControlClass::Create, OutboundMessage::CreateParameterFile)
                .into(),
            UserAction::OpenSettings => self
                .forward_gated(ControlClass::Settings, OutboundMessage::OpenSettings)
                .into(),
            UserAction::ToggleOverlay { id } => {
                self.overlay.toggle(&id);
                ActionOutcome::Applied
            }
            UserAction::OutsideClick { inside } => {
                if self.overlay.outside_click(inside.as_deref()) {
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::Ignored(IgnoreReason::NothingToDo)
                }
            }
        }
    }

    fn require(&self, control: ControlClass) -> Result<(), IgnoreReason> {
        if self.enablement().is_enabled(control) {
            Ok(())
        } else {
            Err(IgnoreReason::ControlDisabled(control))
        }
    }

    fn forward_gated(
        &mut self,
        control: ControlClass,
        message: OutboundMessage,
    ) -> Result<(), IgnoreReason> {
        self.require(control)?;
        self.outbox.push(message);
        Ok(())
    }

    fn forward_artifact(
        &mut self,
        name: &str,
        available: impl Fn(&RunRecord) -> bool,
        message: impl FnOnce(String) -> OutboundMessage,
    ) -> Result<(), IgnoreReason> {
        let record = self.runs.record(name).ok_or(IgnoreReason::UnknownTarget)?;
        if !available(record) {
            return Err(IgnoreReason::ArtifactUnavailable);
        }
        self.outbox.push(message(name.to_string()));
        Ok(())
    }

    pub fn set_scenario(&mut self, name: &str, enabled: bool) -> Result<(), IgnoreReason> {
        self.require(ControlClass::Toggles)?;
        match self.store.baseline(name) {
            None => Err(IgnoreReason::UnknownTarget),
            Some(BaselineEntry::DisabledByPolicy) => Err(IgnoreReason::PolicyLocked),
            Some(_) => {
                self.store.set_scenario(name, enabled);
                Ok(())
            }
        }
    }

    pub fn toggle_group(&mut self, group: &str, target: Option<bool>) -> Result<(), IgnoreReason> {
        self.require(ControlClass::Toggles)?;
        if !self.store.has_group(group) {
            return Err(IgnoreReason::UnknownTarget);
        }
        self.store
            .toggle_group(group, target)
            .map(|_| ())
            .ok_or(IgnoreReason::NothingToDo)
    }

    pub fn apply_changes(&mut self) -> Result<(), IgnoreReason> {
        self.require(ControlClass::Apply)?;
        let payload = self.store.commit();
        tracing::info!(
            scenarios = payload.states.len(),
            changed = payload.changed.len(),
            "forwarding scenario changes to host"
        );
        self.outbox.push(OutboundMessage::ApplyChanges(payload));
        Ok(())
    }

    /// Queues a run request unless the scenario is already running.
    pub fn trigger_run(&mut self, name: &str, trigger: RunTrigger) -> Result<(), IgnoreReason> {
        self.require(ControlClass::RunTriggers)?;
        if self.store.baseline(name).is_none() {
            return Err(IgnoreReason::UnknownTarget);
        }
        if self.runs.is_running(name) {
            tracing::debug!(scenario = %name, "suppressing run trigger for running scenario");
            return Err(IgnoreReason::AlreadyRunning);
        }
        self.outbox.push(trigger.message(name));
        Ok(())
    }

    fn add_favorite(&mut self, name: &str) -> ActionOutcome {
        let Some(meta) = self.store.meta(name) else {
            return ActionOutcome::Rejected(ActionError::UnknownScenario(name.to_string()));
        };
        let Some(uri) = meta.uri.clone() else {
            return ActionOutcome::Rejected(ActionError::MissingScenarioUri(name.to_string()));
        };
        if self.favorites.contains(&uri) {
            return ActionOutcome::Ignored(IgnoreReason::NothingToDo);
        }
        let entry = FavoriteEntry {
            uri,
            name: name.to_string(),
            scenario_code: meta.scenario_code.clone().unwrap_or_default(),
        };
        self.outbox.push(OutboundMessage::AddFavorite(entry));
        ActionOutcome::Applied
    }

    fn remove_favorite(&mut self, uri: &str) -> ActionOutcome {
        let uri = uri.trim();
        if uri.is_empty() {
            return ActionOutcome::Rejected(ActionError::EmptyFavoriteUri);
        }
        if self.favorites.remove_optimistic(uri).is_none() {
            tracing::debug!(%uri, "favorite not cached locally; forwarding removal anyway");
        }
        self.outbox.push(OutboundMessage::RemoveFavorite {
            uri: uri.to_string(),
        });
        ActionOutcome::Applied
    }

    fn rename_group(&mut self, group: &str, new_name: &str) -> ActionOutcome {
        if let Err(reason) = self.require(ControlClass::Create) {
            return ActionOutcome::Ignored(reason);
        }
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return ActionOutcome::Rejected(ActionError::EmptyGroupName);
        }
        if !self.store.has_group(group) {
            return ActionOutcome::Rejected(ActionError::UnknownGroup(group.to_string()));
        }
        if new_name == group {
            return ActionOutcome::Ignored(IgnoreReason::NothingToDo);
        }
        if self.store.has_group(new_name) {
            return ActionOutcome::Rejected(ActionError::GroupNameTaken(new_name.to_string()));
        }
        self.outbox.push(OutboundMessage::RenameGroup {
            old_name: group.to_string(),
            new_name: new_name.to_string(),
        });
        ActionOutcome::Applied
    }

    pub fn hover_tooltip(&mut self, target: &str) {
        self.tooltip.hover(target);
    }

    pub fn leave_tooltip(&mut self, now: Instant) {
        self.tooltip.leave(now);
    }

    /// Advances the tooltip debounce. Returns `true` when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.tooltip.tick(now)
    }

    #[must_use]
    pub fn scenario_row(
        &self,
        name: &str,
        change_set: &ChangeSet,
        enablement: &ControlEnablement,
    ) -> Option<ScenarioRowView> {
        let baseline = self.store.baseline(name)?;
        let meta = self.store.meta(name)?;
        let policy_locked = !baseline.is_toggleable();
        let running = self.runs.is_running(name);
        Some(ScenarioRowView {
            name: name.to_string(),
            group: meta.group.clone(),
            checked: self.store.pending(name).unwrap_or(false),
            disabled: policy_locked || !enablement.toggles,
            policy_locked,
            changed: change_set.contains(name),
            run_badge: self.runs.badge(name),
            run_enabled: ControlGate::run_trigger_enabled(enablement, running),
            affected: self.gate.flags.highlight_affected_main_scenarios
                && self.affected.contains(name),
            favorite: meta
                .uri
                .as_deref()
                .is_some_and(|uri| self.favorites.contains(uri)),
        })
    }

    #[must_use]
    pub fn view(&self) -> PanelView {
        let enablement = self.enablement();
        let controls: BTreeMap<&'static str, bool> = enablement.to_map();

        if self.gate.degraded {
            return PanelView {
                degraded: true,
                status: self.status_text.clone(),
                build_in_progress: self.gate.build_in_progress,
                groups: Vec::new(),
                counts: Default::default(),
                controls,
                favorites: Vec::new(),
                favorites_sort_mode: self.favorites.sort_mode(),
                active_overlay: None,
                tooltip: None,
            };
        }

        let change_set = self.store.diff();
        let groups = aggregate_groups(&self.store, &change_set, &self.expansion)
            .into_iter()
            .map(|summary| {
                let scenarios = self
                    .store
                    .group_members(&summary.name)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|name| self.scenario_row(name, &change_set, &enablement))
                    .collect();
                GroupView { summary, scenarios }
            })
            .collect();

        PanelView {
            degraded: false,
            status: self.status_text.clone(),
            build_in_progress: self.gate.build_in_progress,
            groups,
            counts: change_set.counts,
            controls,
            favorites: self.favorites.sorted(),
            favorites_sort_mode: self.favorites.sort_mode(),
            active_overlay: self.overlay.active().map(ToString::to_string),
            tooltip: self.tooltip.visible().map(ToString::to_string),
        }
    }
}
