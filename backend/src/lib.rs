//! # Timetable Engine
//!
//! Scheduling conflict validation and classroom utilization analytics for
//! institutional timetables.
//!
//! The engine reads faculty, classrooms, time slots, timetable entries and
//! enrollments through a small set of repository traits and never writes.
//! Two services sit on top of them:
//!
//! - **Conflict validator**: decides whether one proposed faculty /
//!   classroom / slot assignment may be added to a term without
//!   double-booking, and enriches a clean verdict with advisory warnings.
//! - **Utilization analyzer**: computes per-room utilization, weekly slot
//!   trends, department usage, peak hours and room recommendations for a
//!   reporting window.
//!
//! ## Architecture
//!
//! - [`models`]: Domain entities and id newtypes
//! - [`db`]: Repository traits, in-memory and Postgres backends, factory
//! - [`services`]: Validator and analyzer
//! - [`routes`]: Request and response types of each operation
//! - [`api`]: Flat re-export of the public data types
//! - [`http`]: Axum server exposing both services

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
