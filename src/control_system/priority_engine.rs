// src/control_system/priority_engine.rs

use crate::config::JunctionConfig;
use crate::data_structures::LaneId;
use crate::global_variables::HIGH_PRIORITY_SCORE;
use crate::simulation_engine::junction::JunctionState;

/// Edge of high-priority mode seen during a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    Entered,
    Exited,
}

/// Computes lane priorities, high-priority mode and emergency overflow.
///
/// Pure with respect to the queue counts and the previous mode: no clock,
/// no randomness, no I/O apart from logging the mode edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityEngine {
    pub high_priority_threshold: usize,
    pub normal_priority_threshold: usize,
    pub emergency_threshold: usize,
    pub priority_cooldown: u32,
}

impl Default for PriorityEngine {
    fn default() -> Self {
        PriorityEngine::from_config(&JunctionConfig::default())
    }
}

impl PriorityEngine {
    pub fn from_config(config: &JunctionConfig) -> Self {
        Self {
            high_priority_threshold: config.high_priority_threshold,
            normal_priority_threshold: config.normal_priority_threshold,
            emergency_threshold: config.emergency_threshold,
            priority_cooldown: config.priority_cooldown,
        }
    }

    /// Updates high-priority mode from AL2's backlog, then rescores every lane.
    ///
    /// Between the two thresholds (inclusive) the previous mode is kept.
    pub fn recompute(&self, state: &mut JunctionState) -> Option<ModeTransition> {
        let al2_count = state.count(LaneId::A2);
        let was_high = state.high_priority_mode();
        let mut transition = None;

        if al2_count > self.high_priority_threshold {
            if !was_high {
                log::info!("HIGH PRIORITY MODE ACTIVATED - AL2 has {} vehicles", al2_count);
                transition = Some(ModeTransition::Entered);
            }
            state.set_high_priority_mode(true);
            state.set_priority_cooldown(self.priority_cooldown);
        } else if al2_count < self.normal_priority_threshold {
            if was_high {
                log::info!("HIGH PRIORITY MODE DEACTIVATED - AL2 has {} vehicles", al2_count);
                transition = Some(ModeTransition::Exited);
            }
            state.set_high_priority_mode(false);
            state.set_priority_cooldown(0);
        }

        let high = state.high_priority_mode();
        for lane in LaneId::all() {
            let score = if lane == LaneId::A2 && high {
                HIGH_PRIORITY_SCORE
            } else {
                state.count(lane) as i32
            };
            state.lane_mut(lane).set_priority(score);
        }
        transition
    }

    /// Forces the light onto the first lane (canonical order) whose backlog
    /// exceeds the emergency threshold. Clears the override when none does.
    pub fn check_emergency(&self, state: &mut JunctionState) -> Option<LaneId> {
        let overflowing = LaneId::all().find(|&lane| state.count(lane) > self.emergency_threshold);
        match overflowing {
            Some(lane) => {
                log::warn!(
                    "EMERGENCY OVERFLOW: Lane {} has {} vehicles",
                    lane,
                    state.count(lane)
                );
                state.set_emergency_override(true);
                state.set_current_lane(Some(lane));
            }
            None => state.set_emergency_override(false),
        }
        overflowing
    }

    /// Non-empty lane with the strictly highest priority; ties go to the
    /// lower canonical index.
    pub fn highest_priority_lane(&self, state: &JunctionState) -> Option<LaneId> {
        let mut best: Option<(LaneId, i32)> = None;
        for queue in state.lanes().iter().filter(|q| !q.is_empty()) {
            if best.map_or(true, |(_, max)| queue.priority() > max) {
                best = Some((queue.lane(), queue.priority()));
            }
        }
        best.map(|(lane, _)| lane)
    }
}
