// src/simulation_engine/ingestion.rs

use std::fs::OpenOptions;
use std::io::{self, Read};
use std::ops::AddAssign;
use std::path::Path;

use fd_lock::RwLock;
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{JunctionConfig, LaneRouting};
use crate::data_structures::{LaneId, Road, Vehicle};
use crate::error::{JunctionError, JunctionResult};
use crate::shutdown;
use crate::simulation_engine::junction::{JunctionState, SharedJunction};

/// Counters for one batch (or a running total of batches).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub accepted: usize,
    pub dropped_full: usize,
    pub malformed: usize,
}

impl IngestionReport {
    pub fn total(&self) -> usize {
        self.accepted + self.dropped_full + self.malformed
    }
}

impl AddAssign for IngestionReport {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.dropped_full += other.dropped_full;
        self.malformed += other.malformed;
    }
}

/// Turns `ID:ROAD:LANE` lines into vehicles on the right lane queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestionAdapter {
    routing: LaneRouting,
}

impl IngestionAdapter {
    pub fn new(routing: LaneRouting) -> Self {
        Self { routing }
    }

    /// Parses one record. Blank lines give `Ok(None)`; fields after the
    /// third are ignored.
    pub fn parse_record(&self, line: &str) -> JunctionResult<Option<Vehicle>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let malformed = |reason: &str| JunctionError::MalformedRecord {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = line.split(':').map(str::trim);
        let (id, road, lane) = match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(road), Some(lane)) if !id.is_empty() => (id, road, lane),
            _ => return Err(malformed("expected VEHICLE_ID:ROAD:LANE")),
        };

        let mut road_chars = road.chars();
        let road = match (road_chars.next().and_then(Road::from_letter), road_chars.next()) {
            (Some(road), None) => road,
            _ => return Err(malformed("road must be one of A, B, C, D")),
        };
        let lane: i64 = lane
            .parse()
            .map_err(|_| malformed("lane is not an integer"))?;

        let lane_id = match self.routing {
            LaneRouting::FoldToThird => {
                let position = match lane {
                    1 => 1,
                    2 => 2,
                    _ => 3,
                };
                LaneId::new(road, position)
            }
            LaneRouting::Strict => u8::try_from(lane).ok().and_then(|l| LaneId::new(road, l)),
        }
        .ok_or_else(|| malformed("lane must be 1, 2 or 3"))?;

        Ok(Some(Vehicle::new(id, lane_id)))
    }

    /// Routes every record of a batch. A full lane or a bad line never stops
    /// the rest of the batch.
    pub fn ingest_lines<'a, I>(&self, state: &mut JunctionState, lines: I) -> IngestionReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut report = IngestionReport::default();
        for line in lines {
            match self.parse_record(line) {
                Ok(None) => {}
                Ok(Some(vehicle)) => {
                    let (id, lane) = (vehicle.id().to_string(), vehicle.lane_id());
                    match state.enqueue(vehicle) {
                        Ok(()) => {
                            report.accepted += 1;
                            log::debug!("Added vehicle {} to {}", id, lane);
                        }
                        Err(e) => {
                            report.dropped_full += 1;
                            log::warn!("{}", e);
                        }
                    }
                }
                Err(e) => {
                    report.malformed += 1;
                    log::debug!("Skipping {}", e);
                }
            }
        }
        report
    }
}

/// Takes every pending record out of the vehicle file and leaves it empty.
///
/// The file is read and truncated under an exclusive lock. Writers append
/// under the same lock through their own append-mode handles, so a record
/// is either in this batch or still in the file afterwards, even when the
/// writer keeps its handle open across batches.
///
/// A missing vehicle file is `SourceUnavailable`.
pub async fn take_batch(source: &Path) -> JunctionResult<String> {
    let source = source.to_path_buf();
    task::spawn_blocking(move || drain_locked(&source))
        .await
        .map_err(io::Error::other)?
}

fn drain_locked(source: &Path) -> JunctionResult<String> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(source)
        .map_err(|e| JunctionError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        })?;
    let mut lock = RwLock::new(file);
    let mut guard = lock.write()?;
    let mut bytes = Vec::new();
    guard.read_to_end(&mut bytes)?;
    guard.set_len(0)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Takes and routes one batch. Returns `SourceUnavailable` when there is
/// nothing to read yet.
pub async fn ingest_once(
    junction: &SharedJunction,
    adapter: &IngestionAdapter,
    config: &JunctionConfig,
) -> JunctionResult<IngestionReport> {
    let text = take_batch(&config.vehicle_file).await?;
    let report = junction.with_state(|state| adapter.ingest_lines(state, text.lines()))?;
    Ok(report)
}

/// Ingestion worker: polls the vehicle file every `ingestion_poll` until
/// shutdown. Only a poisoned junction guard ends it early.
pub async fn run_ingestion(
    junction: SharedJunction,
    config: JunctionConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JunctionResult<()> {
    let adapter = IngestionAdapter::new(config.lane_routing);
    let mut interval = time::interval(config.ingestion_poll());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut totals = IngestionReport::default();
    log::info!(
        "File reading worker started on {}",
        config.vehicle_file.display()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown::requested(&mut shutdown_rx) => break,
        }
        match ingest_once(&junction, &adapter, &config).await {
            Ok(report) => {
                totals += report;
                if report.total() > 0 {
                    log::info!(
                        "Processed batch: {} added, {} dropped (lane full), {} malformed; totals {:?}",
                        report.accepted,
                        report.dropped_full,
                        report.malformed,
                        totals
                    );
                }
            }
            Err(JunctionError::SourceUnavailable { .. }) => {}
            Err(e) if e.is_recoverable() => log::warn!("Ingestion batch failed: {}", e),
            Err(e) => return Err(e),
        }
    }

    log::info!("File reading worker stopped; totals {:?}", totals);
    Ok(())
}
