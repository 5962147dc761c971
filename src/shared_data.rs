// src/shared_data.rs

use crate::data_structures::LaneId;
use crate::global_variables::LANE_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Consistent copy of the junction taken under the state guard, plus the
/// observer's light animation progress. This is all a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionSnapshot {
    pub timestamp: u64,
    /// 1..=12 for the green lane, 0 when idle.
    pub current_light: u8,
    /// 0.0 (all red) to 1.0 (fully green).
    pub light_transition_progress: f32,
    pub high_priority_mode: bool,
    pub emergency_override: bool,
    pub priority_cooldown: u32,
    pub lane_counts: [usize; LANE_COUNT],
    pub lane_priorities: [i32; LANE_COUNT],
    pub served_totals: [u64; LANE_COUNT],
    /// Up to 8 front vehicle ids per lane, canonical lane order.
    pub front_vehicle_ids: Vec<Vec<String>>,
}

impl JunctionSnapshot {
    pub fn current_lane(&self) -> Option<LaneId> {
        LaneId::from_light(self.current_light)
    }

    pub fn count(&self, lane: LaneId) -> usize {
        self.lane_counts[lane.index()]
    }

    pub fn total_waiting(&self) -> usize {
        self.lane_counts.iter().sum()
    }
}

/// Why the scheduler picked the lane a vehicle was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServeReason {
    Priority,
    Emergency,
    Normal,
}

impl fmt::Display for ServeReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServeReason::Priority => write!(f, "PRIORITY"),
            ServeReason::Emergency => write!(f, "EMERGENCY"),
            ServeReason::Normal => write!(f, "NORMAL"),
        }
    }
}

/// One vehicle leaving the junction. Appended to the served-vehicle log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedVehicle {
    pub timestamp: u64,
    pub vehicle_id: String,
    pub lane: LaneId,
    pub reason: ServeReason,
    /// Vehicles still waiting in the lane afterwards.
    pub remaining: usize,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
