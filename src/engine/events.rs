// src/engine/events.rs

//! Observability hook for runs.
//!
//! The coordinator calls [`EventSink::on_event`] for every dispatch, completion
//! and failure, one at a time and in the order it observes them. Sinks never
//! see events concurrently.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::RunEvent;

pub trait EventSink {
    fn on_event(&mut self, event: &RunEvent);
}

/// Default sink: logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Dispatched { task } => info!(task = %task, "task dispatched"),
            RunEvent::Completed { task } => info!(task = %task, "task completed"),
            RunEvent::Failed { task, cause } => warn!(task = %task, %cause, "task failed"),
        }
    }
}

impl<F> EventSink for F
where
    F: FnMut(&RunEvent),
{
    fn on_event(&mut self, event: &RunEvent) {
        self(event)
    }
}

/// Forwards events to another task over an unbounded channel.
///
/// A closed receiver is not an error for the run; events are simply dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, event: &RunEvent) {
        let _ = self.tx.send(event.clone());
    }
}
