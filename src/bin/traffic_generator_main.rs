// src/bin/traffic_generator_main.rs

use junction_sim::config::JunctionConfig;
use junction_sim::shutdown;
use junction_sim::simulation_engine::traffic_generator::run_generator;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = JunctionConfig::from_env()?;
    println!("Starting traffic generator...");

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let generator = tokio::spawn(run_generator(config, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(true);
    generator.await?;
    Ok(())
}
