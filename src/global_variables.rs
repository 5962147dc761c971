// src/global_variables.rs

// Lane geometry
pub const ROAD_COUNT: usize = 4;
pub const LANES_PER_ROAD: usize = 3;
pub const LANE_COUNT: usize = ROAD_COUNT * LANES_PER_ROAD;

// Queue and priority policy
pub const MAX_QUEUE_SIZE: usize = 200;
pub const HIGH_PRIORITY_THRESHOLD: usize = 10;
pub const NORMAL_PRIORITY_THRESHOLD: usize = 5;
pub const EMERGENCY_THRESHOLD: usize = 15;
pub const PRIORITY_COOLDOWN: u32 = 10;
/// Priority given to AL2 while high-priority mode is on. Larger than any queue length.
pub const HIGH_PRIORITY_SCORE: i32 = 1000;

// Cadences
pub const TIME_PER_VEHICLE_SECS: f64 = 4.0;
pub const SCHEDULER_TICK_MS: u64 = 200;
pub const INGESTION_POLL_MS: u64 = 1000;
pub const OBSERVER_REFRESH_MS: u64 = 33;
pub const SNAPSHOT_EXPORT_MS: u64 = 1000;
pub const GENERATOR_INTERVAL_MS: u64 = 1500;
pub const GENERATOR_RETRY_MS: u64 = 2000;
/// Status board is logged once every this many scheduler ticks (5 s at 200 ms).
pub const STATUS_BOARD_EVERY_TICKS: u64 = 25;

// Observation
pub const MAX_VISIBLE_VEHICLES: usize = 8;
/// Light transition progress gained (or lost) per second.
pub const LIGHT_TRANSITION_RATE: f32 = 2.0;

// Files
pub const VEHICLE_FILE: &str = "vehicles.data";
pub const SERVED_LOG_FILE: &str = "served_vehicles.csv";
pub const SNAPSHOT_FILE: &str = "junction_snapshot.json";
pub const SERVED_CHART_FILE: &str = "served_per_lane.png";
pub const CONFIG_ENV_VAR: &str = "JUNCTION_CONFIG";
