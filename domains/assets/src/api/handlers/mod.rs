//! HTTP handlers for the Assets domain

pub mod batches;
pub mod delivery;
pub mod photos;
pub mod sweeps;
