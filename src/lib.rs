//! Attendance Integrity & Check-In/Out Engine
//!
//! This crate validates employee check-ins and check-outs against assigned
//! work-site geofences and a GPS anti-spoofing score, and records them in a
//! per-employee, per-day state machine that accepts at most one check-in and
//! one check-out, however many requests race.

#![warn(missing_docs)]

pub mod api;
pub mod attendance;
pub mod config;
pub mod error;
pub mod models;
pub mod validation;
