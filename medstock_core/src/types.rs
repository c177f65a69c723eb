//! Core domain types for the medication stock tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - People and medications (reference data)
//! - Person/medication associations carrying the stock ledger
//! - Derived views (actions, stock status) that are never persisted

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Reference Data
// ============================================================================

/// A person whose medication is being tracked
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: u32,
    pub first_names: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
}

impl Person {
    /// Full display name
    pub fn name(&self) -> String {
        format!("{} {}", self.first_names, self.surname)
    }
}

/// A medication that can be associated with people
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    pub id: u32,
    pub name: String,
}

// ============================================================================
// Associations
// ============================================================================

/// The person/medication pairing that carries dosing and stock state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonMedication {
    pub id: u32,
    pub person_id: u32,
    pub medication_id: u32,
    /// Tablets taken per day
    pub daily_dose: i32,
    /// Tablets currently held
    pub stock: i32,
    /// Date through which the stock figure is reconciled
    pub last_taken: Option<NaiveDate>,
    pub active: bool,
}

impl PersonMedication {
    /// Whole days of medication left at the current daily dose
    pub fn days_remaining(&self) -> i32 {
        if self.daily_dose <= 0 {
            return 0;
        }
        self.stock / self.daily_dose
    }

    /// The date on which the current stock runs out
    pub fn last_day(&self) -> Option<NaiveDate> {
        let last_taken = self.last_taken?;
        last_taken.checked_add_days(Days::new(self.days_remaining().max(0) as u64))
    }

    /// The suggested date for ordering more stock
    pub fn order_more_date(&self, lead_time_days: u32) -> Option<NaiveDate> {
        self.last_day()?
            .checked_sub_days(Days::new(u64::from(lead_time_days)))
    }

    /// True when the ledger has not been reconciled through `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.last_taken.map_or(true, |taken| taken < today)
    }
}

/// Recommended action for an association
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MedicationAction {
    #[serde(rename = "Take dose")]
    TakeDose,
    #[serde(rename = "Order more")]
    OrderMore,
}

impl fmt::Display for MedicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationAction::TakeDose => write!(f, "Take dose"),
            MedicationAction::OrderMore => write!(f, "Order more"),
        }
    }
}

/// An association as returned by the ledger: the stored record plus the
/// derived, never-persisted fields
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TrackedAssociation {
    #[serde(flatten)]
    pub association: PersonMedication,
    pub actions: Vec<MedicationAction>,
    /// Tablets requested beyond the available stock (the clamped amount)
    pub shortfall: i32,
}

/// Stock level classification used for display
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Ok,
    Warning,
    Critical,
}

impl StockStatus {
    /// Classify days remaining against the warning and critical thresholds
    pub fn classify(days_remaining: i32, warning_days: u32, critical_days: u32) -> Self {
        let days = i64::from(days_remaining);
        if days <= i64::from(critical_days) {
            StockStatus::Critical
        } else if days <= i64::from(warning_days) {
            StockStatus::Warning
        } else {
            StockStatus::Ok
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::Ok => write!(f, "ok"),
            StockStatus::Warning => write!(f, "warning"),
            StockStatus::Critical => write!(f, "critical"),
        }
    }
}
