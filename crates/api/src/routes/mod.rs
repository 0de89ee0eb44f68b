//! HTTP route handlers.

pub mod activities;
pub mod approval;
pub mod health;
pub mod registrations;
