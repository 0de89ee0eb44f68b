//! Shared utilities and common types for the dorm admin backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Offset pagination arithmetic
//! - Reusable field validators

pub mod pagination;
pub mod validation;
