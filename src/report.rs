// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::pool::Reserves;
use crate::math;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub seed: u64,

    // Outcome
    pub swaps_requested: u32,
    pub swaps_executed: u32,
    /// Rejected swaps keyed by error kind
    pub rejections: BTreeMap<String, u32>,
    pub invariant_held: bool,
    pub quote_mismatches: u32,

    // Pool details
    pub initial: ReserveDetails,
    pub final_state: ReserveDetails,
    pub k_growth_bps: u128,

    // Flow details
    pub volume: FlowDetails,
    pub fees_retained: FlowDetails,

    // Metadata
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveDetails {
    pub reserve1: u64,
    pub reserve2: u64,
    /// Decimal string; u128 does not survive every JSON reader
    pub k: String,
}

impl From<Reserves> for ReserveDetails {
    fn from(reserves: Reserves) -> Self {
        Self {
            reserve1: reserves.reserve1,
            reserve2: reserves.reserve2,
            k: reserves.k().to_string(),
        }
    }
}

/// Per-asset totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDetails {
    pub asset1: u64,
    pub asset2: u64,
}

impl SimulationReport {
    pub fn new(seed: u64, swaps_requested: u32, initial: Reserves) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed,
            swaps_requested,
            swaps_executed: 0,
            rejections: BTreeMap::new(),
            invariant_held: true,
            quote_mismatches: 0,
            initial: initial.into(),
            final_state: initial.into(),
            k_growth_bps: 0,
            volume: FlowDetails::default(),
            fees_retained: FlowDetails::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn record_rejection(&mut self, kind: &str) {
        *self.rejections.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn finish(mut self, initial: Reserves, final_reserves: Reserves) -> Self {
        self.final_state = final_reserves.into();
        self.k_growth_bps = math::invariant_growth_bps(initial.k(), final_reserves.k());
        self.timestamp = Utc::now();
        self
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_report_creation() {
        let initial = Reserves::new(1_000, 1_000);
        let mut report = SimulationReport::new(42, 3, initial);
        report.record_rejection("insufficient_amount");
        report.record_rejection("insufficient_amount");
        report.swaps_executed = 1;

        let report = report.finish(initial, Reserves::new(1_100, 910));

        assert_eq!(report.rejections.get("insufficient_amount"), Some(&2));
        assert_eq!(report.final_state.k, "1001000");
        assert_eq!(report.k_growth_bps, 10);
        assert!(report.invariant_held);
    }

    #[test]
    fn test_report_json() {
        let report = SimulationReport::new(1, 0, Reserves::default());
        let value = report.to_value().unwrap();
        assert_eq!(value["seed"], 1);
        assert_eq!(value["initial"]["k"], "0");
        assert!(value["timestamp"].is_string());
    }
}
