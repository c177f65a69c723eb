#![forbid(unsafe_code)]

//! Core domain model and business logic for medication stock tracking.
//!
//! This crate provides:
//! - Domain types (people, medications, person/medication associations)
//! - Association store with validation (in-memory and file-backed)
//! - Stock ledger engine (take, un-take, fast-forward, skip)
//! - Action derivation ("Take dose", "Order more")
//! - Configuration, logging and CSV exchange

pub mod types;
pub mod error;
pub mod clock;
pub mod config;
pub mod logging;
pub mod data;
pub mod reference;
pub mod store;
pub mod actions;
pub mod ledger;
pub mod exchange;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use data::HealthData;
pub use reference::ReferenceStore;
pub use store::{AssociationStore, AssociationUpdate, FileStore, MemoryStore};
pub use actions::ActionGenerator;
pub use ledger::{calculate_stock_date, StockLedger};
pub use exchange::{export_associations, import_associations};
