#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

//! Host-agnostic core of the scenario switcher panel.
//!
//! The host owns persistence and execution. This crate keeps the panel's view
//! of that world consistent: it reconciles snapshots against local edits,
//! decides which controls are live, and produces the commands the host acts on.

pub mod actions;
pub mod affected;
pub mod config;
pub mod control_gate;
pub mod error;
pub mod favorites;
pub mod groups;
pub mod overlay;
pub mod panel;
pub mod protocol;
pub mod run_status;
pub mod scenario_state;
pub mod view;

pub use actions::{ActionOutcome, IgnoreReason, UserAction};
pub use config::PanelConfig;
pub use control_gate::{ControlClass, ControlEnablement, ControlGate, FeatureFlags, gate};
pub use error::{ActionError, ConfigError, ProtocolError};
pub use favorites::{FavoriteEntry, FavoritesRegistry, SortMode};
pub use panel::ScenarioPanel;
pub use protocol::{
    HostChannel, InboundMessage, OutboundMessage, RunTrigger, encode_outbound_message,
    flush_outbound, parse_inbound_message,
};
pub use run_status::{RunBadge, RunStatus, RunStatusMachine};
pub use scenario_state::{BaselineEntry, ChangeSet, ScenarioStateStore};
pub use view::{GroupView, PanelView, ScenarioRowView};
