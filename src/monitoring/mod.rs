// src/monitoring/mod.rs

pub mod traffic_monitoring_system;
