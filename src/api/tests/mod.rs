//! API tests
//!
//! - part_01: health, info, metrics and unknown routes
//! - part_02: single prediction
//! - part_03: batch prediction

mod part_02;
