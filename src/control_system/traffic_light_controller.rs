// src/control_system/traffic_light_controller.rs

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::JunctionConfig;
use crate::control_system::priority_engine::{ModeTransition, PriorityEngine};
use crate::data_structures::LaneId;
use crate::error::{JunctionError, JunctionResult};
use crate::global_variables::STATUS_BOARD_EVERY_TICKS;
use crate::shared_data::{current_timestamp, ServeReason, ServedVehicle};
use crate::shutdown;
use crate::simulation_engine::junction::{JunctionState, SharedJunction};

/// What happened during one scheduler tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickOutcome {
    pub mode_transition: Option<ModeTransition>,
    /// Lane forced green by the emergency check this tick.
    pub emergency_lane: Option<LaneId>,
    /// Whether a serve was due by the cadence.
    pub serve_due: bool,
    pub served: Option<ServedVehicle>,
}

/// Decides which lane is green and releases one vehicle per
/// `time_per_vehicle`.
///
/// Selection runs every tick; serving runs only when the cadence is due.
#[derive(Debug, Clone)]
pub struct TrafficLightController {
    engine: PriorityEngine,
    time_per_vehicle: Duration,
    last_serve: Instant,
    ticks: u64,
}

impl TrafficLightController {
    /// `start` counts as the last serve, so the first vehicle leaves one
    /// full `time_per_vehicle` later.
    pub fn new(config: &JunctionConfig, start: Instant) -> Self {
        Self {
            engine: PriorityEngine::from_config(config),
            time_per_vehicle: config.time_per_vehicle(),
            last_serve: start,
            ticks: 0,
        }
    }

    pub fn engine(&self) -> &PriorityEngine {
        &self.engine
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One evaluation: rescore, check emergency, then serve if due.
    ///
    /// Must run with the junction guard held for its whole duration.
    pub fn tick(&mut self, state: &mut JunctionState, now: Instant) -> TickOutcome {
        if self.ticks % STATUS_BOARD_EVERY_TICKS == 0 {
            log::info!("{}", state.status_board());
        }
        self.ticks += 1;

        let mut outcome = TickOutcome {
            mode_transition: self.engine.recompute(state),
            emergency_lane: self.engine.check_emergency(state),
            ..TickOutcome::default()
        };

        if now.saturating_duration_since(self.last_serve) < self.time_per_vehicle {
            return outcome;
        }
        outcome.serve_due = true;

        let (target, reason) = match outcome.emergency_lane {
            Some(lane) => (Some(lane), ServeReason::Emergency),
            None if state.high_priority_mode() => {
                let al2 = Some(LaneId::A2).filter(|&lane| state.count(lane) > 0);
                (al2, ServeReason::Priority)
            }
            None => (self.engine.highest_priority_lane(state), ServeReason::Normal),
        };

        let Some(lane) = target else {
            state.set_current_lane(None);
            return outcome;
        };

        match state.serve(lane) {
            Ok(vehicle) => {
                state.set_current_lane(Some(lane));
                self.last_serve = now;
                let remaining = state.count(lane);
                log::info!(
                    "[{}] Dequeued: {} from {} (count now: {})",
                    reason,
                    vehicle.id(),
                    lane,
                    remaining
                );
                outcome.served = Some(ServedVehicle {
                    timestamp: current_timestamp(),
                    vehicle_id: vehicle.id().to_string(),
                    lane,
                    reason,
                    remaining,
                });
            }
            Err(JunctionError::QueueEmpty { .. }) => state.set_current_lane(None),
            Err(e) => log::error!("Unexpected error serving {}: {}", lane, e),
        }
        outcome
    }
}

/// Scheduler worker: ticks every `scheduler_tick` until shutdown.
///
/// Served vehicles go to `served_tx`; a closed receiver is ignored.
/// Returns `GuardPoisoned` if another worker panicked while holding the
/// junction guard.
pub async fn run_scheduler(
    junction: SharedJunction,
    config: JunctionConfig,
    served_tx: mpsc::UnboundedSender<ServedVehicle>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JunctionResult<()> {
    let mut controller = TrafficLightController::new(&config, Instant::now());
    let mut interval = time::interval(config.scheduler_tick());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log::info!("Queue processing worker started");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown::requested(&mut shutdown_rx) => break,
        }
        let outcome = junction.with_state(|state| controller.tick(state, Instant::now()))?;
        if let Some(served) = outcome.served {
            let _ = served_tx.send(served);
        }
    }

    log::info!(
        "Queue processing worker stopped after {} ticks",
        controller.ticks()
    );
    Ok(())
}
