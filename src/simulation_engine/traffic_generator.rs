// src/simulation_engine/traffic_generator.rs

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use fd_lock::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task;
use tokio::time::sleep;

use crate::config::JunctionConfig;
use crate::data_structures::{LaneId, Road};
use crate::error::JunctionResult;
use crate::global_variables::LANES_PER_ROAD;
use crate::shutdown;

/// Plate-style id: two letters, a digit, two letters, three digits.
pub fn generate_vehicle_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(8);
    for pattern in ['L', 'L', 'D', 'L', 'L', 'D', 'D', 'D'] {
        let c = match pattern {
            'L' => (b'A' + rng.random_range(0..26u8)) as char,
            _ => (b'0' + rng.random_range(0..10u8)) as char,
        };
        id.push(c);
    }
    id
}

/// A random arrival on a uniformly chosen road and lane.
pub fn generate_arrival<R: Rng + ?Sized>(rng: &mut R) -> (String, LaneId) {
    let id = generate_vehicle_id(rng);
    let road = Road::ALL[rng.random_range(0..Road::ALL.len())];
    let lane = rng.random_range(1..=LANES_PER_ROAD as u8);
    let lane_id = LaneId::new(road, lane).unwrap_or(LaneId::A2);
    (id, lane_id)
}

/// One `ID:ROAD:LANE` line, newline included.
pub fn generate_record_line<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (id, lane) = generate_arrival(rng);
    format!("{}:{}:{}\n", id, lane.road(), lane.lane())
}

/// Appends one record under the vehicle file's exclusive lock, opening and
/// closing the file each time.
pub async fn append_record(path: &Path, line: &str) -> JunctionResult<()> {
    let (path, line) = (path.to_path_buf(), line.to_string());
    task::spawn_blocking(move || append_locked(&path, &line))
        .await
        .map_err(io::Error::other)?
}

fn append_locked(path: &Path, line: &str) -> JunctionResult<()> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut lock = RwLock::new(file);
    let mut guard = lock.write()?;
    guard.write_all(line.as_bytes())?;
    Ok(())
}

/// Generator loop: one arrival every `generator_interval`, retrying after
/// `generator_retry` when the file cannot be written.
pub async fn run_generator(config: JunctionConfig, mut shutdown_rx: watch::Receiver<bool>) {
    let mut rng = StdRng::from_os_rng();
    log::info!(
        "Generating vehicles into {}",
        config.vehicle_file.display()
    );

    while !shutdown::is_requested(&shutdown_rx) {
        let line = generate_record_line(&mut rng);
        let pause = match append_record(&config.vehicle_file, &line).await {
            Ok(()) => {
                log::info!("Generated: {}", line.trim_end());
                config.generator_interval()
            }
            Err(e) => {
                log::warn!(
                    "Error opening {}: {}",
                    config.vehicle_file.display(),
                    e
                );
                config.generator_retry()
            }
        };
        tokio::select! {
            _ = sleep(pause) => {}
            _ = shutdown::requested(&mut shutdown_rx) => break,
        }
    }
    log::info!("Generator stopped");
}
