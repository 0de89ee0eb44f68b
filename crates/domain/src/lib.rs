//! Domain layer for the dorm admin backend.
//!
//! This crate contains:
//! - Domain models (Activity, ActivityRegistration, User, approval links)
//! - Store and gateway abstractions over the hosted backend
//! - The activity resource controller and the approval executor

pub mod models;
pub mod services;
