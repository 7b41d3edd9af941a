//! Intake Geo - address geocoding and nearest-provider matching
//!
//! This library provides the location core of the referral intake CRM:
//! a geocoding resolver with a relaxing address fallback cascade, the batch
//! job that stores its results, and the haversine matcher that shortlists
//! providers near a referral.

pub mod config;
pub mod core;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{haversine_distance, GeocodingResolver, Matcher, RetryPolicy};
pub use models::{GeoPoint, GeocodeResult, ProviderRecord, RankedMatch};
