//! Event sinks: structured logs, in-memory recording, fan-out

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::domain::pool::{EventSink, PoolEvent};

/// Writes every pool event as a structured `tracing` record
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &PoolEvent) {
        let name = event.name();
        match event {
            PoolEvent::LiquidityAdded { provider, amount1, amount2 }
            | PoolEvent::LiquidityRemoved { provider, amount1, amount2 } => {
                info!(event = name, %provider, amount1, amount2);
            }
            PoolEvent::TokensSwapped {
                trader,
                asset_in,
                asset_out,
                amount_in,
                amount_out,
            } => {
                info!(
                    event = name,
                    %trader,
                    %asset_in,
                    %asset_out,
                    amount_in,
                    amount_out
                );
            }
            PoolEvent::EmergencyWithdrawal { recipient, amount1, amount2 } => {
                info!(event = name, %recipient, amount1, amount2);
            }
            PoolEvent::AuthorityTransferred { previous, new_authority } => {
                info!(event = name, %previous, %new_authority);
            }
        }
    }
}

/// Keeps emitted events in memory, in order
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<PoolEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.log().clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<PoolEvent> {
        std::mem::take(&mut *self.log())
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, Vec<PoolEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &PoolEvent) {
        self.log().push(event.clone());
    }
}

/// Forwards each event to several sinks
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: &PoolEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
