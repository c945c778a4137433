#![cfg_attr(test, allow(clippy::expect_used))]

//! Replays a JSON-lines script through [`ScenarioPanel`].
//!
//! Each non-blank line is one step:
//!
//! ```text
//! {"source":"host","message":{"command":"loadInitialState", ...}}
//! {"source":"user","action":{"action":"setScenario","name":"Checkout","enabled":true}}
//! ```
//!
//! Outbound commands are written to the output as JSON lines in the order the
//! panel produced them. Lines starting with `#` are comments.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use scenario_panel_core::protocol::inbound_message_from_value;
use scenario_panel_core::{
    ActionOutcome, HostChannel, OutboundMessage, PanelView, ScenarioPanel, UserAction,
    encode_outbound_message, flush_outbound,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ScriptStep {
    /// Raw host message; parsed by the panel so malformed payloads exercise
    /// the same lenient path a live host would.
    Host { message: Value },
    User { action: UserAction },
}

pub fn parse_script_line(line: &str) -> Result<Option<ScriptStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let step = serde_json::from_str(line).context("decode script step")?;
    Ok(Some(step))
}

/// Writes each outbound command as one JSON line.
pub struct JsonLinesChannel<W> {
    writer: W,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}

impl<W: Write> HostChannel for JsonLinesChannel<W> {
    type Error = String;

    fn post_message(&mut self, message: &OutboundMessage) -> Result<(), Self::Error> {
        let line = encode_outbound_message(message).map_err(|error| error.to_string())?;
        writeln!(self.writer, "{line}").map_err(|error| error.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub host_messages: usize,
    pub applied: usize,
    pub ignored: usize,
    pub rejected: usize,
    pub delivered: usize,
}

pub fn apply_step<C: HostChannel>(
    panel: &mut ScenarioPanel,
    step: ScriptStep,
    channel: &mut C,
    summary: &mut ReplaySummary,
) {
    summary.steps += 1;
    match step {
        ScriptStep::Host { message } => {
            summary.host_messages += 1;
            match inbound_message_from_value(&message) {
                Ok(message) => {
                    panel.handle_message(message);
                }
                Err(error) => tracing::warn!(%error, "dropping malformed host message"),
            }
        }
        ScriptStep::User { action } => match panel.dispatch(action) {
            ActionOutcome::Applied => summary.applied += 1,
            ActionOutcome::Ignored(_) => summary.ignored += 1,
            ActionOutcome::Rejected(_) => summary.rejected += 1,
        },
    }
    summary.delivered += flush_outbound(channel, panel.drain_outbound());
}

/// Runs every step in `reader`. A line that is not a valid step aborts the
/// replay; host payload problems inside a valid step do not.
pub fn replay<R, C>(panel: &mut ScenarioPanel, reader: R, channel: &mut C) -> Result<ReplaySummary>
where
    R: BufRead,
    C: HostChannel,
{
    let mut summary = ReplaySummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("read script line {line_number}"))?;
        let Some(step) =
            parse_script_line(&line).with_context(|| format!("script line {line_number}"))?
        else {
            continue;
        };
        apply_step(panel, step, channel, &mut summary);
    }
    tracing::info!(
        steps = summary.steps,
        host_messages = summary.host_messages,
        applied = summary.applied,
        ignored = summary.ignored,
        rejected = summary.rejected,
        delivered = summary.delivered,
        "script replay finished"
    );
    Ok(summary)
}

pub fn write_view<W: Write>(writer: &mut W, view: &PanelView, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, view).context("encode panel view")?;
    } else {
        serde_json::to_writer(&mut *writer, view).context("encode panel view")?;
    }
    writeln!(writer).context("write panel view")?;
    Ok(())
}
