// src/simulation_engine/mod.rs

pub mod ingestion;
pub mod junction;
pub mod lane;
pub mod traffic_generator;
