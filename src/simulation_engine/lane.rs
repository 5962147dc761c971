// src/simulation_engine/lane.rs

use crate::data_structures::{LaneId, Vehicle};
use crate::error::{JunctionError, JunctionResult};

/// Fixed-capacity FIFO of vehicles waiting in one lane.
///
/// Storage is a ring buffer allocated once at construction; the capacity
/// models how many vehicles physically fit on the road and never changes.
#[derive(Debug, Clone)]
pub struct BoundedLaneQueue {
    /// Lane this queue belongs to.
    lane: LaneId,
    /// Ring buffer slots, `capacity` long.
    slots: Box<[Option<Vehicle>]>,
    /// Index of the oldest vehicle.
    head: usize,
    /// Number of occupied slots.
    count: usize,
    /// Score assigned by the priority engine each tick.
    priority: i32,
}

impl BoundedLaneQueue {
    /// Creates an empty queue. A capacity of 0 is promoted to 1.
    pub fn new(lane: LaneId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lane,
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            count: 0,
            priority: 0,
        }
    }

    pub fn lane(&self) -> LaneId {
        self.lane
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Appends a vehicle at the tail. A full queue is left untouched and the
    /// vehicle is dropped with `QueueFull`.
    pub fn enqueue(&mut self, vehicle: Vehicle) -> JunctionResult<()> {
        if self.is_full() {
            return Err(JunctionError::QueueFull {
                lane: self.lane,
                vehicle_id: vehicle.id().to_string(),
            });
        }
        let tail = (self.head + self.count) % self.capacity();
        self.slots[tail] = Some(vehicle);
        self.count += 1;
        Ok(())
    }

    /// Removes the oldest vehicle, or `None` when the lane is empty.
    pub fn dequeue(&mut self) -> Option<Vehicle> {
        if self.is_empty() {
            return None;
        }
        let vehicle = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        vehicle
    }

    /// Oldest vehicle without removing it.
    pub fn front(&self) -> Option<&Vehicle> {
        self.iter().next()
    }

    /// Waiting vehicles from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        (0..self.count).filter_map(move |offset| {
            self.slots[(self.head + offset) % self.capacity()].as_ref()
        })
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: &str) -> Vehicle {
        Vehicle::new(id, LaneId::A2)
    }

    #[test]
    fn indices_wrap_around_the_ring() {
        let mut queue = BoundedLaneQueue::new(LaneId::A2, 3);
        for round in 0..5 {
            queue.enqueue(vehicle(&format!("X{}a", round))).unwrap();
            queue.enqueue(vehicle(&format!("X{}b", round))).unwrap();
            assert_eq!(queue.dequeue().unwrap().id(), format!("X{}a", round));
            assert_eq!(queue.dequeue().unwrap().id(), format!("X{}b", round));
        }
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 3);
    }

    #[test]
    fn zero_capacity_is_promoted_to_one() {
        let mut queue = BoundedLaneQueue::new(LaneId::A2, 0);
        assert!(queue.enqueue(vehicle("ONE")).is_ok());
        assert!(queue.is_full());
        assert!(matches!(
            queue.enqueue(vehicle("TWO")),
            Err(JunctionError::QueueFull { .. })
        ));
    }

    #[test]
    fn iter_lists_oldest_first_after_wrap() {
        let mut queue = BoundedLaneQueue::new(LaneId::A2, 3);
        for id in ["V1", "V2", "V3"] {
            queue.enqueue(vehicle(id)).unwrap();
        }
        queue.dequeue();
        queue.enqueue(vehicle("V4")).unwrap();
        let ids: Vec<&str> = queue.iter().map(Vehicle::id).collect();
        assert_eq!(ids, vec!["V2", "V3", "V4"]);
        assert_eq!(queue.front().map(Vehicle::id), Some("V2"));
    }
}
