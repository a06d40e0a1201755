//! Credit Risk API Library
//!
//! This library turns InfoExperto credit reports into a risk classification and, for
//! the ambiguous middle tier, an explainable internal score. It also contains the
//! thin HTTP shell around that engine: caller authentication, the provider client,
//! and the report cache.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `assessment`: Normalize-then-decide pipeline and its output document.
//! - `auth`: Bearer token extraction and identity verification.
//! - `circuit_breaker`: Circuit breaker for provider calls.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Request/response models.
//! - `provider`: InfoExperto report client.
//! - `report`: Report normalization into internal metrics.
//! - `report_cache`: Checksummed cache of provider reports.
//! - `scoring`: Rule-based risk decision engine.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod assessment;
pub mod auth;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod report;
pub mod report_cache;
pub mod scoring;
