// src/services/mod.rs

pub mod cache;
pub mod connection;
pub mod credentials;
pub mod recorder;
pub mod transform;
