//! `echallan` - Backend for an RTO face-scan kiosk
//!
//! This library holds the driver record store, the face-match policy, e-challan
//! memo creation, daily analytics, and the HTTP API the kiosk frontend talks
//! to.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analytics;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod memo;
pub mod records;
pub mod server;
pub mod storage;

pub use analytics::AnalyticsSnapshot;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use matcher::{FaceMatch, FaceMatcher, MatchKind};
pub use records::{Driver, DriverSummary, FaceDescriptor, Memo, PaymentStatus};
pub use storage::{Storage, StorageStats};
