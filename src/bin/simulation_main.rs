// src/bin/simulation_main.rs

use junction_sim::config::JunctionConfig;
use junction_sim::control_system::traffic_light_controller::run_scheduler;
use junction_sim::monitoring::traffic_monitoring_system::run_observer;
use junction_sim::shutdown;
use junction_sim::simulation_engine::ingestion::run_ingestion;
use junction_sim::simulation_engine::junction::{JunctionState, SharedJunction};
use std::error::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = JunctionConfig::from_env()?;
    println!("Traffic Junction Simulator starting...");

    let junction = SharedJunction::new(JunctionState::new(config.queue_capacity));
    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let (served_tx, served_rx) = mpsc::unbounded_channel();

    let mut workers = JoinSet::new();
    workers.spawn(run_ingestion(
        junction.clone(),
        config.clone(),
        shutdown_rx.clone(),
    ));
    workers.spawn(run_scheduler(
        junction.clone(),
        config.clone(),
        served_tx,
        shutdown_rx.clone(),
    ));
    workers.spawn(run_observer(junction, config.clone(), served_rx, shutdown_rx));
    println!(
        "Simulator initialized. Waiting for vehicles in {}...",
        config.vehicle_file.display()
    );

    let mut failure: Option<Box<dyn Error>> = None;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                log::error!("Could not listen for Ctrl-C: {}", e);
            }
            log::info!("Shutdown requested");
        }
        Some(joined) = workers.join_next() => {
            // A worker only returns early on a fatal error.
            match joined {
                Ok(Ok(())) => log::warn!("A worker stopped unexpectedly"),
                Ok(Err(e)) => failure = Some(e.into()),
                Err(e) => failure = Some(e.into()),
            }
        }
    }

    let _ = shutdown_tx.send(true);
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("Worker failed: {}", e);
                failure.get_or_insert_with(|| e.into());
            }
            Err(e) => {
                log::error!("Worker panicked: {}", e);
                failure.get_or_insert_with(|| e.into());
            }
        }
    }

    match failure {
        Some(e) => {
            eprintln!("Simulator stopped: {}", e);
            Err(e)
        }
        None => {
            println!("Simulator stopped.");
            Ok(())
        }
    }
}
