// tests/ingestion_tests.rs

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::Duration;

use junction_sim::config::{JunctionConfig, LaneRouting};
use junction_sim::data_structures::{LaneId, Road};
use junction_sim::error::JunctionError;
use junction_sim::shutdown;
use junction_sim::simulation_engine::ingestion::{
    ingest_once, run_ingestion, IngestionAdapter, IngestionReport,
};
use junction_sim::simulation_engine::junction::{JunctionState, SharedJunction};
use junction_sim::simulation_engine::traffic_generator::append_record;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> JunctionConfig {
    JunctionConfig {
        vehicle_file: dir.path().join("vehicles.data"),
        served_log_file: dir.path().join("served.csv"),
        snapshot_file: dir.path().join("snapshot.json"),
        ingestion_poll_ms: 20,
        ..JunctionConfig::default()
    }
}

fn lane(road: Road, n: u8) -> LaneId {
    LaneId::new(road, n).unwrap()
}

#[tokio::test]
async fn batch_is_routed_counted_and_cleared() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    fs::write(
        &config.vehicle_file,
        "ABC12345:A:2\n\nXYZ98765:B:1\nbroken-line\nQQQ11111:Z:1\nDDD00001:D:3\n",
    )
    .unwrap();
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));
    let adapter = IngestionAdapter::new(config.lane_routing);

    let report = ingest_once(&junction, &adapter, &config).await.unwrap();
    assert_eq!(
        report,
        IngestionReport {
            accepted: 3,
            dropped_full: 0,
            malformed: 2,
        }
    );
    let snap = junction.snapshot(8).unwrap();
    assert_eq!(snap.count(LaneId::A2), 1);
    assert_eq!(snap.count(lane(Road::B, 1)), 1);
    assert_eq!(snap.count(lane(Road::D, 3)), 1);
    assert_eq!(snap.front_vehicle_ids[1], vec!["ABC12345".to_string()]);
    assert_eq!(fs::read_to_string(&config.vehicle_file).unwrap(), "");

    // An emptied file is an empty batch, not a missing source.
    let again = ingest_once(&junction, &adapter, &config).await.unwrap();
    assert_eq!(again.total(), 0);
}

#[tokio::test]
async fn missing_source_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));

    let err = ingest_once(&junction, &IngestionAdapter::default(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, JunctionError::SourceUnavailable { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn full_lane_drops_record_and_batch_continues() {
    let dir = TempDir::new().unwrap();
    let config = JunctionConfig {
        queue_capacity: 2,
        ..config_in(&dir)
    };
    fs::write(
        &config.vehicle_file,
        "CAR00001:C:1\nCAR00002:C:1\nCAR00003:C:1\nCAR00004:A:1\n",
    )
    .unwrap();
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));

    let report = ingest_once(&junction, &IngestionAdapter::default(), &config)
        .await
        .unwrap();
    assert_eq!(report.accepted, 3);
    assert_eq!(report.dropped_full, 1);
    let snap = junction.snapshot(8).unwrap();
    assert_eq!(snap.front_vehicle_ids[6], vec!["CAR00001", "CAR00002"]);
    assert_eq!(snap.count(lane(Road::A, 1)), 1);
}

#[tokio::test]
async fn writer_holding_its_handle_across_batches_loses_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let mut writer = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&config.vehicle_file)
        .unwrap();
    writer.write_all(b"FIRST001:A:1\n").unwrap();
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));
    let adapter = IngestionAdapter::default();

    assert_eq!(
        ingest_once(&junction, &adapter, &config).await.unwrap().accepted,
        1
    );
    writer.write_all(b"SECOND01:A:1\n").unwrap();
    assert_eq!(
        ingest_once(&junction, &adapter, &config).await.unwrap().accepted,
        1
    );

    let snap = junction.snapshot(8).unwrap();
    assert_eq!(snap.total_waiting(), 2);
    assert_eq!(snap.front_vehicle_ids[0], vec!["FIRST001", "SECOND01"]);
}

#[tokio::test]
async fn appends_after_a_batch_land_in_the_next_one() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    append_record(&config.vehicle_file, "FIRST001:A:1\n")
        .await
        .unwrap();
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));
    let adapter = IngestionAdapter::default();

    assert_eq!(
        ingest_once(&junction, &adapter, &config).await.unwrap().accepted,
        1
    );
    append_record(&config.vehicle_file, "SECOND01:A:1\n")
        .await
        .unwrap();
    assert_eq!(
        ingest_once(&junction, &adapter, &config).await.unwrap().accepted,
        1
    );
    assert_eq!(junction.snapshot(8).unwrap().count(lane(Road::A, 1)), 2);
}

#[tokio::test]
async fn strict_routing_counts_bad_lanes_as_malformed() {
    let dir = TempDir::new().unwrap();
    let config = JunctionConfig {
        lane_routing: LaneRouting::Strict,
        ..config_in(&dir)
    };
    fs::write(&config.vehicle_file, "BAD00001:A:4\nGOOD0001:A:3\n").unwrap();
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));

    let report = ingest_once(&junction, &IngestionAdapter::new(config.lane_routing), &config)
        .await
        .unwrap();
    assert_eq!(report.malformed, 1);
    assert_eq!(report.accepted, 1);
}

#[tokio::test]
async fn worker_picks_up_file_and_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));
    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let worker = tokio::spawn(run_ingestion(junction.clone(), config.clone(), shutdown_rx));

    // Nothing to read yet; the worker keeps polling.
    tokio::time::sleep(Duration::from_millis(60)).await;
    append_record(&config.vehicle_file, "LATE0001:D:2\n")
        .await
        .unwrap();

    let mut seen = 0;
    for _ in 0..200 {
        seen = junction.snapshot(8).unwrap().count(lane(Road::D, 2));
        if seen == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen, 1);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker exits after shutdown")
        .unwrap()
        .unwrap();
}
