// src/monitoring/traffic_monitoring_system.rs

use crate::config::JunctionConfig;
use crate::data_structures::LaneId;
use crate::error::JunctionResult;
use crate::global_variables::{LANE_COUNT, LIGHT_TRANSITION_RATE, MAX_VISIBLE_VEHICLES};
use crate::shared_data::{JunctionSnapshot, ServeReason, ServedVehicle};
use crate::shutdown;
use crate::simulation_engine::junction::SharedJunction;
use plotters::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Green-light fade used by renderers: rises toward 1.0 while a lane is
/// served and falls toward 0.0 while idle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightTransition {
    progress: f32,
}

impl LightTransition {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn advance(&mut self, green: bool, elapsed: Duration) -> f32 {
        let step = elapsed.as_secs_f32() * LIGHT_TRANSITION_RATE;
        self.progress = if green {
            (self.progress + step).min(1.0)
        } else {
            (self.progress - step).max(0.0)
        };
        self.progress
    }
}

// Generic helper to append a record to a CSV file. Headers only go into a new file.
pub fn log_to_csv<T: Serialize>(path: &Path, record: &T) -> JunctionResult<()> {
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

pub fn log_served_vehicle(path: &Path, record: &ServedVehicle) {
    if let Err(e) = log_to_csv(path, record) {
        log::error!("Error logging served vehicle {}: {}", record.vehicle_id, e);
    }
}

/// Writes the snapshot as JSON next to `path` and renames it into place, so
/// a renderer never reads a half-written file.
pub async fn export_snapshot(path: &Path, snapshot: &JunctionSnapshot) -> JunctionResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let payload = serde_json::to_vec_pretty(snapshot)?;
    tokio::fs::write(&tmp, payload).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Observation worker. Copies a snapshot under the guard every
/// `observer_refresh`, animates the light outside it, exports the snapshot
/// at most once per `snapshot_export`, and logs every served vehicle.
pub async fn run_observer(
    junction: SharedJunction,
    config: JunctionConfig,
    mut served_rx: mpsc::UnboundedReceiver<ServedVehicle>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JunctionResult<()> {
    let mut interval = time::interval(config.observer_refresh());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut transition = LightTransition::default();
    let mut last_frame = Instant::now();
    let mut last_export: Option<Instant> = None;
    let mut served_open = true;
    log::info!("Observer started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut snapshot = junction.snapshot(MAX_VISIBLE_VEHICLES)?;
                let now = Instant::now();
                snapshot.light_transition_progress =
                    transition.advance(snapshot.current_light != 0, now - last_frame);
                last_frame = now;

                if last_export.map_or(true, |t| now - t >= config.snapshot_export()) {
                    if let Err(e) = export_snapshot(&config.snapshot_file, &snapshot).await {
                        log::warn!("Could not export snapshot: {}", e);
                    }
                    last_export = Some(now);
                }
            }
            served = served_rx.recv(), if served_open => match served {
                Some(record) => log_served_vehicle(&config.served_log_file, &record),
                None => served_open = false,
            },
            _ = shutdown::requested(&mut shutdown_rx) => break,
        }
    }

    while let Ok(record) = served_rx.try_recv() {
        log_served_vehicle(&config.served_log_file, &record);
    }
    let mut last = junction.snapshot(MAX_VISIBLE_VEHICLES)?;
    last.light_transition_progress = transition.progress();
    if let Err(e) = export_snapshot(&config.snapshot_file, &last).await {
        log::warn!("Could not export final snapshot: {}", e);
    }
    log::info!("Observer stopped");
    Ok(())
}

/// Totals over a served-vehicle log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServedSummary {
    pub total: u64,
    pub per_lane: [u64; LANE_COUNT],
    pub per_reason: HashMap<ServeReason, u64>,
}

pub fn read_served_log(path: &Path) -> JunctionResult<Vec<ServedVehicle>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

pub fn summarize(records: &[ServedVehicle]) -> ServedSummary {
    let mut summary = ServedSummary::default();
    for record in records {
        summary.total += 1;
        summary.per_lane[record.lane.index()] += 1;
        *summary.per_reason.entry(record.reason).or_insert(0) += 1;
    }
    summary
}

pub fn print_summary(summary: &ServedSummary) {
    println!("Served vehicles: {}", summary.total);
    for lane in LaneId::all() {
        println!("  {}: {}", lane, summary.per_lane[lane.index()]);
    }
    for reason in [ServeReason::Normal, ServeReason::Priority, ServeReason::Emergency] {
        println!(
            "  {}: {}",
            reason,
            summary.per_reason.get(&reason).copied().unwrap_or(0)
        );
    }
}

// Bar chart of served vehicles per lane using Plotters.
pub fn draw_served_chart(summary: &ServedSummary, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let max = summary.per_lane.iter().copied().max().unwrap_or(0).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption("Vehicles served per lane", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..LANE_COUNT as u32).into_segmented(), 0u64..max + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("vehicles")
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => LaneId::from_index(*i as usize)
                .map(|lane| lane.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(8)
            .data(
                summary
                    .per_lane
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| (i as u32, n)),
            ),
    )?;

    root.present()?;
    println!("Served-per-lane chart saved to {}", path.display());
    Ok(())
}
