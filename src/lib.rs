//! Viability scoring for planned children's activity-center sites.
//!
//! [`score_location`] turns a loosely-typed [`LocationRecord`] into a 0-100
//! [`ScoreResult`] with a five-tier [`RiskLevel`] and a per-category breakdown.

pub mod config;
pub mod core;
mod utils;

pub use crate::core::location::LocationRecord;
pub use crate::core::score::{RiskLevel, ScoreResult, score_location, score_location_with};
