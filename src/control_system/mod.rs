// src/control_system/mod.rs

pub mod priority_engine;
pub mod traffic_light_controller;
