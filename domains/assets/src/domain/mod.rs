//! Domain layer for the Assets domain

pub mod entities;
pub mod projection;
pub mod state;
