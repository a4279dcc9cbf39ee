//! services/api/src/lib.rs
//!
//! The `api` service: HTTP adapters for the carbon tracker core.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
