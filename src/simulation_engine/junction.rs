// src/simulation_engine/junction.rs

use std::sync::{Arc, Mutex, MutexGuard};

use crate::data_structures::{LaneId, Road, Vehicle};
use crate::error::{JunctionError, JunctionResult};
use crate::global_variables::LANE_COUNT;
use crate::shared_data::{current_timestamp, JunctionSnapshot};
use crate::simulation_engine::lane::BoundedLaneQueue;

/// The twelve lane queues and the scheduler's view of the junction.
///
/// The scheduler is the only writer of the light and mode fields; the
/// ingestion path only appends to queues through [`JunctionState::enqueue`].
#[derive(Debug, Clone)]
pub struct JunctionState {
    /// One queue per lane in canonical order.
    lanes: Vec<BoundedLaneQueue>,
    /// Light number of the lane being served, 0 when idle.
    current_light: u8,
    high_priority_mode: bool,
    priority_cooldown: u32,
    emergency_override: bool,
    /// Vehicles served per lane since startup.
    served: [u64; LANE_COUNT],
}

impl JunctionState {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            lanes: LaneId::all()
                .map(|lane| BoundedLaneQueue::new(lane, queue_capacity))
                .collect(),
            current_light: 0,
            high_priority_mode: false,
            priority_cooldown: 0,
            emergency_override: false,
            served: [0; LANE_COUNT],
        }
    }

    pub fn lane(&self, lane: LaneId) -> &BoundedLaneQueue {
        &self.lanes[lane.index()]
    }

    pub(crate) fn lane_mut(&mut self, lane: LaneId) -> &mut BoundedLaneQueue {
        &mut self.lanes[lane.index()]
    }

    /// All lanes in canonical order.
    pub fn lanes(&self) -> &[BoundedLaneQueue] {
        &self.lanes
    }

    pub fn count(&self, lane: LaneId) -> usize {
        self.lane(lane).count()
    }

    /// Queues a vehicle on the lane it belongs to.
    pub fn enqueue(&mut self, vehicle: Vehicle) -> JunctionResult<()> {
        self.lane_mut(vehicle.lane_id()).enqueue(vehicle)
    }

    /// Takes the front vehicle off `lane` and counts it as served.
    pub(crate) fn serve(&mut self, lane: LaneId) -> JunctionResult<Vehicle> {
        let vehicle = self
            .lane_mut(lane)
            .dequeue()
            .ok_or(JunctionError::QueueEmpty { lane })?;
        self.served[lane.index()] += 1;
        Ok(vehicle)
    }

    pub fn current_light(&self) -> u8 {
        self.current_light
    }

    pub fn current_lane(&self) -> Option<LaneId> {
        LaneId::from_light(self.current_light)
    }

    pub(crate) fn set_current_lane(&mut self, lane: Option<LaneId>) {
        self.current_light = lane.map_or(0, LaneId::light);
    }

    pub fn high_priority_mode(&self) -> bool {
        self.high_priority_mode
    }

    pub(crate) fn set_high_priority_mode(&mut self, on: bool) {
        self.high_priority_mode = on;
    }

    pub fn priority_cooldown(&self) -> u32 {
        self.priority_cooldown
    }

    pub(crate) fn set_priority_cooldown(&mut self, ticks: u32) {
        self.priority_cooldown = ticks;
    }

    pub fn emergency_override(&self) -> bool {
        self.emergency_override
    }

    pub(crate) fn set_emergency_override(&mut self, on: bool) {
        self.emergency_override = on;
    }

    pub fn served(&self, lane: LaneId) -> u64 {
        self.served[lane.index()]
    }

    /// Multi-line summary of lane counts, mode and light for the log.
    pub fn status_board(&self) -> String {
        let mut board = String::from("TRAFFIC JUNCTION STATUS\n");
        for road in Road::ALL {
            let counts: Vec<String> = LaneId::all()
                .filter(|lane| lane.road() == road)
                .map(|lane| format!("{}={:2}", lane, self.count(lane)))
                .collect();
            board.push_str(&format!("Road {}: {}\n", road, counts.join(" | ")));
        }
        board.push_str(&format!(
            "Priority Mode: {} | Current Light: {}",
            if self.high_priority_mode { "HIGH" } else { "NORMAL" },
            self.current_light
        ));
        board
    }

    /// Copies out what an observer needs. `light_transition_progress` is left
    /// at 0.0 for the observer to fill in.
    pub fn snapshot(&self, max_visible: usize) -> JunctionSnapshot {
        let mut lane_counts = [0; LANE_COUNT];
        let mut lane_priorities = [0; LANE_COUNT];
        for (i, queue) in self.lanes.iter().enumerate() {
            lane_counts[i] = queue.count();
            lane_priorities[i] = queue.priority();
        }
        JunctionSnapshot {
            timestamp: current_timestamp(),
            current_light: self.current_light,
            light_transition_progress: 0.0,
            high_priority_mode: self.high_priority_mode,
            emergency_override: self.emergency_override,
            priority_cooldown: self.priority_cooldown,
            lane_counts,
            lane_priorities,
            served_totals: self.served,
            front_vehicle_ids: self
                .lanes
                .iter()
                .map(|queue| {
                    queue
                        .iter()
                        .take(max_visible)
                        .map(|v| v.id().to_string())
                        .collect()
                })
                .collect(),
        }
    }
}

/// Handle to the junction shared by the ingestion, scheduler and observer
/// workers. Every logical operation runs under the one mutex.
#[derive(Debug, Clone)]
pub struct SharedJunction {
    state: Arc<Mutex<JunctionState>>,
}

impl SharedJunction {
    pub fn new(state: JunctionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Acquires the guard. A poisoned mutex is the one fatal junction error.
    pub fn lock(&self) -> JunctionResult<MutexGuard<'_, JunctionState>> {
        self.state.lock().map_err(|_| JunctionError::GuardPoisoned)
    }

    /// Runs `op` with exclusive access and releases the guard before returning.
    pub fn with_state<R>(&self, op: impl FnOnce(&mut JunctionState) -> R) -> JunctionResult<R> {
        let mut guard = self.lock()?;
        Ok(op(&mut guard))
    }

    pub fn snapshot(&self, max_visible: usize) -> JunctionResult<JunctionSnapshot> {
        self.with_state(|state| state.snapshot(max_visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_routes_by_vehicle_lane() {
        let mut state = JunctionState::new(200);
        let d3 = LaneId::new(Road::D, 3).unwrap();
        state.enqueue(Vehicle::new("DDD00001", d3)).unwrap();
        assert_eq!(state.count(d3), 1);
        assert_eq!(state.lanes().iter().map(|q| q.count()).sum::<usize>(), 1);
    }

    #[test]
    fn serve_counts_and_reports_empty_lane() {
        let mut state = JunctionState::new(200);
        state.enqueue(Vehicle::new("AAA00001", LaneId::A2)).unwrap();
        assert_eq!(state.serve(LaneId::A2).unwrap().id(), "AAA00001");
        assert_eq!(state.served(LaneId::A2), 1);
        assert!(matches!(
            state.serve(LaneId::A2),
            Err(JunctionError::QueueEmpty { lane }) if lane == LaneId::A2
        ));
    }

    #[test]
    fn snapshot_limits_visible_ids() {
        let mut state = JunctionState::new(200);
        for i in 0..10 {
            state
                .enqueue(Vehicle::new(&format!("ID{:06}", i), LaneId::A2))
                .unwrap();
        }
        state.set_current_lane(Some(LaneId::A2));
        let snap = state.snapshot(8);
        assert_eq!(snap.current_light, 2);
        assert_eq!(snap.count(LaneId::A2), 10);
        assert_eq!(snap.front_vehicle_ids[1].len(), 8);
        assert_eq!(snap.front_vehicle_ids[1][0], "ID000000");
        assert!(snap.front_vehicle_ids[0].is_empty());
    }

    #[test]
    fn poisoned_guard_is_reported() {
        let shared = SharedJunction::new(JunctionState::new(4));
        let clone = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("worker died holding the guard");
        })
        .join();
        assert!(matches!(shared.snapshot(8), Err(JunctionError::GuardPoisoned)));
    }
}
