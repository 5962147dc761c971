// src/bin/traffic_monitoring_system_main.rs

use junction_sim::config::JunctionConfig;
use junction_sim::global_variables::SERVED_CHART_FILE;
use junction_sim::monitoring::traffic_monitoring_system::{
    draw_served_chart, print_summary, read_served_log, summarize,
};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = JunctionConfig::from_env()?;
    println!(
        "Reading served vehicles from {}...",
        config.served_log_file.display()
    );

    let records = read_served_log(&config.served_log_file)?;
    if records.is_empty() {
        println!("No served vehicles recorded yet.");
        return Ok(());
    }
    let summary = summarize(&records);
    print_summary(&summary);
    draw_served_chart(&summary, Path::new(SERVED_CHART_FILE))?;
    Ok(())
}
