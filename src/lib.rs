//! Produce Store Library
//!
//! This library provides an in-memory fruit and vegetable inventory served
//! over HTTP, with quantity normalization to grams and a one-time bootstrap
//! import from a JSON dataset.

// Domain modules
pub mod error;
pub mod inventory;

// Infrastructure
pub mod config;
pub mod router;
