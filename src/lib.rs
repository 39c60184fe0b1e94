// src/lib.rs

//! BOE auction harvester library

pub mod delivery;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
