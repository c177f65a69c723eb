//! Recommended actions for medication associations.
//!
//! Actions are derived from the association's current fields every time
//! they are needed and are never stored.

use crate::{MedicationAction, PersonMedication, StockStatus, TrackedAssociation};
use chrono::NaiveDate;

/// Derives the action list for an association
#[derive(Clone, Copy, Debug)]
pub struct ActionGenerator {
    lead_time_days: u32,
}

impl ActionGenerator {
    /// Create a generator using the medication reorder lead time in days
    pub fn new(lead_time_days: u32) -> Self {
        Self { lead_time_days }
    }

    /// Actions for a single association
    ///
    /// - Inactive: none
    /// - Ledger not reconciled through today: take a dose
    /// - Days remaining within the lead time: order more
    pub fn determine(&self, association: &PersonMedication, today: NaiveDate) -> Vec<MedicationAction> {
        let mut actions = Vec::new();

        if !association.active {
            return actions;
        }

        if association.is_due(today) {
            actions.push(MedicationAction::TakeDose);
        }

        if i64::from(association.days_remaining()) <= i64::from(self.lead_time_days) {
            actions.push(MedicationAction::OrderMore);
        }

        actions
    }

    /// Wrap an association in a tracked view with freshly derived actions
    pub fn track(&self, association: PersonMedication, today: NaiveDate) -> TrackedAssociation {
        let actions = self.determine(&association, today);
        TrackedAssociation {
            association,
            actions,
            shortfall: 0,
        }
    }

    /// Tracked views for a collection of associations
    pub fn track_all(&self, associations: Vec<PersonMedication>, today: NaiveDate) -> Vec<TrackedAssociation> {
        associations
            .into_iter()
            .map(|a| self.track(a, today))
            .collect()
    }
}

/// Classify an association's remaining stock for display
pub fn stock_status(association: &PersonMedication, warning_days: u32, critical_days: u32) -> StockStatus {
    StockStatus::classify(association.days_remaining(), warning_days, critical_days)
}
