//! # Aarogya
//!
//! Disease-risk inference for weekly, per-location environmental and health
//! indicators.
//!
//! A trained gradient-boosted classifier predicts one of `Dengue`, `Healthy`,
//! `Malaria` or `Typhoid` from nine fields. This crate owns the serving half
//! of that pipeline: rebuilding the categorical vocabularies the model was
//! trained with, encoding raw JSON records into the exact feature layout the
//! model expects, scoring them, and exposing the result over HTTP.
//!
//! ## Features
//!
//! - **Deterministic encoding**: fixed column order, sorted vocabularies, and
//!   an explicit fallback for categories never seen in training
//! - **Shared immutable model**: one [`service::ServiceContext`] built at
//!   startup and read by every request without locks
//! - **Batch scoring with partial failure**: bad elements are reported in
//!   place and never fail the batch
//! - **Gateway**: token-authenticated proxy with per-route upstream timeouts
//!
//! ## Example
//!
//! ```rust
//! use aarogya::service::ServiceContext;
//! use serde_json::json;
//!
//! let context = ServiceContext::demo().unwrap();
//! let scored = context
//!     .predict_value(&json!({
//!         "Week": "2025-W25",
//!         "Location": "Karol Bagh",
//!         "NDVI": 0.7,
//!         "WaterIndex": 0.8,
//!         "Rainfall_mm": 5.0,
//!         "Humidity_pct": 50.0,
//!         "FeverCases": 3,
//!         "Absenteeism_pct": 2.0,
//!         "ToiletUsage_pct": 90.0
//!     }))
//!     .unwrap();
//!
//! assert_eq!(scored.prediction.prediction, "Healthy");
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 for codes and rates
#![allow(clippy::cast_possible_truncation)] // u128 -> u64 for metrics
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::float_cmp)] // Allow float comparisons in tests

#[cfg(feature = "server")]
pub mod api;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod encoder;
pub mod error;
/// Deterministic demo model and corpus
pub mod fixtures;
/// Authenticating proxy gateway
#[cfg(feature = "gateway")]
pub mod gateway;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod schema;
pub mod service;
pub mod validate;
pub mod vocab;

pub use error::{AarogyaError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
