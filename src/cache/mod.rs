//! Cache module for memoizing forecast fetches
//!
//! This module provides an in-memory cache keyed by the fetch signature
//! (location, requested variables, timezone mode). Entries live until they
//! are explicitly invalidated; nothing is written to disk and nothing expires.

mod manager;

pub use manager::ForecastCache;
