//! Stock ledger engine for medication associations.
//!
//! Each association carries a `(stock, last_taken)` pair. All dosing
//! operations reduce to one primitive, [`StockLedger::update_stock`], which
//! takes a signed number of doses:
//! - negative: doses taken, stock falls and the ledger date moves forward
//! - positive: doses given back, stock rises and the ledger date rewinds
//! - zero: a skipped dose, stock unchanged and the date moves forward a day
//!
//! The ledger date may never pass today. The new date is computed before
//! anything is written, so a rejected operation leaves the association
//! untouched. Stock is floored at zero; the clamped amount is reported as
//! the `shortfall` on the returned view.

use crate::store::ALL;
use crate::{ActionGenerator, AssociationStore, Clock, Error, PersonMedication, Result, TrackedAssociation};
use chrono::{Duration, NaiveDate};

/// Calculate the ledger date after applying `dose_delta` doses
///
/// An unreconciled ledger (`None`) is set to today. Otherwise the date
/// advances by `-dose_delta` days, or by exactly one day for a skip
/// (`dose_delta == 0`). A result after `today` is rejected.
pub fn calculate_stock_date(date: Option<NaiveDate>, dose_delta: i32, today: NaiveDate) -> Result<NaiveDate> {
    let Some(date) = date else {
        tracing::info!("Calculating new stock date: current stock date = null, doses = {}", dose_delta);
        return Ok(today);
    };

    tracing::info!(
        "Calculating new stock date: current stock date = {}, doses = {}",
        date,
        dose_delta
    );

    let days_to_advance = if dose_delta != 0 {
        -i64::from(dose_delta)
    } else {
        1
    };
    let updated = date
        .checked_add_signed(Duration::days(days_to_advance))
        .ok_or_else(|| Error::Other(format!("Cannot move stock date {} by {} days", date, days_to_advance)))?;

    tracing::info!("Advancing stock date by {} days to {}", days_to_advance, updated);

    if updated > today {
        return Err(Error::StockDateOutOfRange(updated));
    }

    Ok(updated)
}

fn doses_to_delta(doses: u32) -> Result<i32> {
    i32::try_from(doses).map_err(|_| Error::Other(format!("{} doses is out of range", doses)))
}

/// New stock level and clamped shortfall after applying `dose_delta` doses
fn calculate_stock(association: &PersonMedication, dose_delta: i32) -> Result<(i32, i32)> {
    let requested = i64::from(association.stock) + i64::from(dose_delta) * i64::from(association.daily_dose);

    if requested < 0 {
        let shortfall = i32::try_from(-requested).unwrap_or(i32::MAX);
        return Ok((0, shortfall));
    }

    let stock = i32::try_from(requested)
        .map_err(|_| Error::Other(format!("Stock level {} is out of range", requested)))?;
    Ok((stock, 0))
}

/// Orchestrates stock and ledger-date changes through an association store
pub struct StockLedger<S, C> {
    store: S,
    clock: C,
    actions: ActionGenerator,
}

impl<S: AssociationStore, C: Clock> StockLedger<S, C> {
    pub fn new(store: S, clock: C, actions: ActionGenerator) -> Self {
        Self { store, clock, actions }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Current state of an association with freshly derived actions
    pub fn get(&self, id: u32) -> Result<Option<TrackedAssociation>> {
        let today = self.today();
        Ok(self.store.get(id)?.map(|a| self.actions.track(a, today)))
    }

    /// Add tablets to the stock; the ledger date is unchanged
    pub fn add_stock(&mut self, id: u32, tablets: i32) -> Result<Option<TrackedAssociation>> {
        tracing::info!("Adding {} tablets to the medication association with ID {}", tablets, id);

        let Some(updated) = self.store.add_stock(id, tablets)? else {
            return Ok(None);
        };
        tracing::info!("Stock level for medication association with ID {} is now {}", id, updated.stock);

        Ok(Some(self.actions.track(updated, self.today())))
    }

    /// Set the stock level; the ledger date is unchanged
    pub fn set_stock(&mut self, id: u32, tablets: i32) -> Result<Option<TrackedAssociation>> {
        let Some(current) = self.store.get(id)? else {
            return Ok(None);
        };
        tracing::info!(
            "Stock level for medication association with ID {} will be updated from {} to {}",
            id,
            current.stock,
            tablets
        );

        let Some(updated) = self.store.set_stock(id, tablets)? else {
            return Ok(None);
        };
        Ok(Some(self.actions.track(updated, self.today())))
    }

    /// Take `doses` doses: stock falls and the ledger date advances
    pub fn decrement(&mut self, id: u32, doses: u32) -> Result<Option<TrackedAssociation>> {
        let delta = doses_to_delta(doses)?;
        self.update_stock(id, -delta)
    }

    /// Give back `doses` doses: stock rises and the ledger date rewinds
    pub fn increment(&mut self, id: u32, doses: u32) -> Result<Option<TrackedAssociation>> {
        let delta = doses_to_delta(doses)?;
        self.update_stock(id, delta)
    }

    /// Skip a dose: stock is unchanged and the ledger date advances one day
    pub fn skip(&mut self, id: u32) -> Result<Option<TrackedAssociation>> {
        self.update_stock(id, 0)
    }

    /// Catch the ledger up to today, one dose per elapsed day
    ///
    /// An unreconciled ledger is simply dated today. A ledger already at
    /// today is left as is.
    pub fn fast_forward(&mut self, id: u32) -> Result<Option<TrackedAssociation>> {
        let today = self.today();
        let Some(association) = self.store.get(id)? else {
            return Ok(None);
        };

        let Some(last_taken) = association.last_taken else {
            return self.update_stock(id, 0);
        };

        let elapsed = (today - last_taken).num_days();
        if elapsed <= 0 {
            tracing::debug!("Medication association with ID {} is already up to date", id);
            return Ok(Some(self.actions.track(association, today)));
        }

        let doses = u32::try_from(elapsed)
            .map_err(|_| Error::Other(format!("{} days is out of range", elapsed)))?;
        self.decrement(id, doses)
    }

    /// Take `doses` doses for each of a person's active associations whose
    /// ledger is not yet reconciled through today
    pub fn decrement_all(&mut self, person_id: u32, doses: u32) -> Result<Vec<TrackedAssociation>> {
        let targets = self.due_targets(person_id)?;
        self.apply_each(targets, |ledger, id| ledger.decrement(id, doses))
    }

    /// Give back `doses` doses for each of a person's active associations
    pub fn increment_all(&mut self, person_id: u32, doses: u32) -> Result<Vec<TrackedAssociation>> {
        let targets = self.active_targets(person_id)?;
        self.apply_each(targets, |ledger, id| ledger.increment(id, doses))
    }

    /// Fast forward each of a person's active associations whose ledger is
    /// not yet reconciled through today
    pub fn fast_forward_all(&mut self, person_id: u32) -> Result<Vec<TrackedAssociation>> {
        let targets = self.due_targets(person_id)?;
        self.apply_each(targets, |ledger, id| ledger.fast_forward(id))
    }

    /// Skip a dose for each of a person's active associations
    pub fn skip_all(&mut self, person_id: u32) -> Result<Vec<TrackedAssociation>> {
        let targets = self.active_targets(person_id)?;
        self.apply_each(targets, |ledger, id| ledger.skip(id))
    }

    fn active_targets(&self, person_id: u32) -> Result<Vec<PersonMedication>> {
        self.store
            .list(&|a| a.person_id == person_id && a.active, 1, ALL)
    }

    fn due_targets(&self, person_id: u32) -> Result<Vec<PersonMedication>> {
        let today = self.today();
        self.store.list(
            &|a| a.person_id == person_id && a.active && a.is_due(today),
            1,
            ALL,
        )
    }

    /// Apply an operation to each target in order
    ///
    /// Not transactional: the first failure is returned and updates already
    /// applied to earlier targets stay committed.
    fn apply_each<F>(&mut self, targets: Vec<PersonMedication>, mut op: F) -> Result<Vec<TrackedAssociation>>
    where
        F: FnMut(&mut Self, u32) -> Result<Option<TrackedAssociation>>,
    {
        let mut updated = Vec::with_capacity(targets.len());
        for target in targets {
            if let Some(tracked) = op(self, target.id)? {
                updated.push(tracked);
            }
        }
        Ok(updated)
    }

    /// Apply a signed number of doses to an association
    fn update_stock(&mut self, id: u32, dose_delta: i32) -> Result<Option<TrackedAssociation>> {
        tracing::info!(
            "Adding {} doses to the medication association with ID {}",
            dose_delta,
            id
        );

        let Some(association) = self.store.get(id)? else {
            return Ok(None);
        };

        let today = self.today();
        let (stock, shortfall) = calculate_stock(&association, dose_delta)?;
        let last_taken = calculate_stock_date(association.last_taken, dose_delta, today)?;

        tracing::info!(
            "Stock level will be updated from {} to {}",
            association.stock,
            stock
        );
        if shortfall > 0 {
            tracing::warn!(
                "Medication association with ID {} was {} tablets short; stock clamped to 0",
                id,
                shortfall
            );
        }

        let Some(updated) = self.store.set_stock_and_date(id, stock, Some(last_taken))? else {
            return Ok(None);
        };

        let mut tracked = self.actions.track(updated, today);
        tracked.shortfall = shortfall;
        Ok(Some(tracked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceStore;
    use crate::{FileStore, FixedClock, MedicationAction, MemoryStore};
    use chrono::Days;

    const LEAD_TIME: u32 = 14;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn days_ago(days: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(days)).unwrap()
    }

    struct Fixture {
        ledger: StockLedger<MemoryStore<FixedClock>, FixedClock>,
        person_id: u32,
        medication_ids: Vec<u32>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = FixedClock::new(today());
            let mut store = MemoryStore::new(clock.clone());
            let person_id = store
                .add_person("Ada", "Lovelace", NaiveDate::from_ymd_opt(1980, 12, 10).unwrap())
                .unwrap()
                .id;
            let medication_ids = ["Atorvastatin", "Bisoprolol", "Clopidogrel"]
                .iter()
                .map(|name| store.add_medication(name).unwrap().id)
                .collect();

            Self {
                ledger: StockLedger::new(store, clock, ActionGenerator::new(LEAD_TIME)),
                person_id,
                medication_ids,
            }
        }

        fn add(&mut self, index: usize, dose: i32, stock: i32, last_taken: Option<NaiveDate>) -> u32 {
            let medication_id = self.medication_ids[index];
            self.ledger
                .store_mut()
                .add(self.person_id, medication_id, dose, stock, last_taken)
                .unwrap()
                .id
        }

        fn stored(&self, id: u32) -> PersonMedication {
            self.ledger.store().get(id).unwrap().unwrap()
        }
    }

    // ------------------------------------------------------------------
    // Date calculation
    // ------------------------------------------------------------------

    #[test]
    fn test_calculate_stock_date_unset_is_today() {
        assert_eq!(calculate_stock_date(None, -3, today()).unwrap(), today());
        assert_eq!(calculate_stock_date(None, 5, today()).unwrap(), today());
        assert_eq!(calculate_stock_date(None, 0, today()).unwrap(), today());
    }

    #[test]
    fn test_calculate_stock_date_directions() {
        assert_eq!(calculate_stock_date(Some(days_ago(3)), -2, today()).unwrap(), days_ago(1));
        assert_eq!(calculate_stock_date(Some(days_ago(3)), 2, today()).unwrap(), days_ago(5));
        assert_eq!(calculate_stock_date(Some(days_ago(1)), 0, today()).unwrap(), today());
    }

    #[test]
    fn test_calculate_stock_date_rejects_future() {
        let result = calculate_stock_date(Some(today()), 0, today());
        assert!(matches!(
            result,
            Err(Error::StockDateOutOfRange(d)) if d == today().succ_opt().unwrap()
        ));
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[test]
    fn test_first_decrement_sets_today() {
        let mut f = Fixture::new();
        let id = f.add(0, 2, 10, None);

        let result = f.ledger.decrement(id, 1).unwrap().unwrap();

        assert_eq!(result.association.stock, 8);
        assert_eq!(result.association.last_taken, Some(today()));
        assert_eq!(result.shortfall, 0);
        assert_eq!(f.stored(id).stock, 8);
    }

    #[test]
    fn test_fast_forward_catches_up() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 5, Some(days_ago(3)));

        let result = f.ledger.fast_forward(id).unwrap().unwrap();

        assert_eq!(result.association.stock, 2);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_skip_keeps_stock() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 3, Some(days_ago(1)));

        let result = f.ledger.skip(id).unwrap().unwrap();

        assert_eq!(result.association.stock, 3);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_decrement_past_today_fails_without_change() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 0, Some(today()));

        let result = f.ledger.decrement(id, 1);

        assert!(matches!(result, Err(Error::StockDateOutOfRange(_))));
        let stored = f.stored(id);
        assert_eq!(stored.stock, 0);
        assert_eq!(stored.last_taken, Some(today()));
    }

    #[test]
    fn test_inactive_excluded_from_bulk_operations() {
        let mut f = Fixture::new();
        let stale = f.add(0, 1, 10, Some(days_ago(5)));
        let unset = f.add(1, 1, 10, None);
        f.ledger.store_mut().deactivate(stale).unwrap();
        f.ledger.store_mut().deactivate(unset).unwrap();

        assert!(f.ledger.decrement_all(f.person_id, 1).unwrap().is_empty());
        assert!(f.ledger.increment_all(f.person_id, 1).unwrap().is_empty());
        assert!(f.ledger.skip_all(f.person_id).unwrap().is_empty());
        assert!(f.ledger.fast_forward_all(f.person_id).unwrap().is_empty());

        assert_eq!(f.stored(stale).stock, 10);
        assert_eq!(f.stored(stale).last_taken, Some(days_ago(5)));
        assert_eq!(f.stored(unset).last_taken, None);
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    #[test]
    fn test_decrement_reduces_stock_and_advances_date() {
        for doses in 0..=5u32 {
            let mut f = Fixture::new();
            let id = f.add(0, 3, 100, Some(days_ago(6)));

            let result = f.ledger.decrement(id, doses).unwrap().unwrap();

            assert_eq!(result.association.stock, 100 - 3 * doses as i32);
            let expected = if doses == 0 {
                days_ago(5)
            } else {
                days_ago(6 - u64::from(doses))
            };
            assert_eq!(result.association.last_taken, Some(expected));
        }
    }

    #[test]
    fn test_decrement_clamps_stock_and_reports_shortfall() {
        let mut f = Fixture::new();
        let id = f.add(0, 2, 3, Some(days_ago(4)));

        let result = f.ledger.decrement(id, 4).unwrap().unwrap();

        assert_eq!(result.association.stock, 0);
        assert_eq!(result.shortfall, 5);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_increment_raises_stock_and_rewinds_date() {
        let mut f = Fixture::new();
        let id = f.add(0, 2, 4, Some(today()));

        let result = f.ledger.increment(id, 3).unwrap().unwrap();

        assert_eq!(result.association.stock, 10);
        assert_eq!(result.association.last_taken, Some(days_ago(3)));
    }

    #[test]
    fn test_increment_then_decrement_round_trips() {
        let mut f = Fixture::new();
        let id = f.add(0, 2, 4, Some(days_ago(1)));

        f.ledger.increment(id, 2).unwrap();
        let result = f.ledger.decrement(id, 2).unwrap().unwrap();

        assert_eq!(result.association.stock, 4);
        assert_eq!(result.association.last_taken, Some(days_ago(1)));
    }

    #[test]
    fn test_skip_from_today_fails() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 3, Some(today()));

        assert!(matches!(f.ledger.skip(id), Err(Error::StockDateOutOfRange(_))));
        assert_eq!(f.stored(id).last_taken, Some(today()));
    }

    #[test]
    fn test_skip_unset_ledger_is_today() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 3, None);

        let result = f.ledger.skip(id).unwrap().unwrap();
        assert_eq!(result.association.stock, 3);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_fast_forward_unset_ledger_dates_today() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 5, None);

        let result = f.ledger.fast_forward(id).unwrap().unwrap();

        assert_eq!(result.association.stock, 5);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_fast_forward_up_to_date_is_noop() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 5, Some(today()));

        let result = f.ledger.fast_forward(id).unwrap().unwrap();

        assert_eq!(result.association.stock, 5);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_fast_forward_clamps_at_zero() {
        let mut f = Fixture::new();
        let id = f.add(0, 2, 3, Some(days_ago(10)));

        let result = f.ledger.fast_forward(id).unwrap().unwrap();

        assert_eq!(result.association.stock, 0);
        assert_eq!(result.shortfall, 17);
        assert_eq!(result.association.last_taken, Some(today()));
    }

    #[test]
    fn test_missing_association_is_noop() {
        let mut f = Fixture::new();

        assert!(f.ledger.decrement(99, 1).unwrap().is_none());
        assert!(f.ledger.increment(99, 1).unwrap().is_none());
        assert!(f.ledger.skip(99).unwrap().is_none());
        assert!(f.ledger.fast_forward(99).unwrap().is_none());
        assert!(f.ledger.add_stock(99, 1).unwrap().is_none());
    }

    #[test]
    fn test_add_and_set_stock_leave_date() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 5, Some(days_ago(2)));

        let added = f.ledger.add_stock(id, 7).unwrap().unwrap();
        assert_eq!(added.association.stock, 12);
        assert_eq!(added.association.last_taken, Some(days_ago(2)));

        let set = f.ledger.set_stock(id, 30).unwrap().unwrap();
        assert_eq!(set.association.stock, 30);
        assert_eq!(set.association.last_taken, Some(days_ago(2)));

        assert!(matches!(f.ledger.set_stock(id, -1), Err(Error::InvalidStockLevel(-1))));
    }

    #[test]
    fn test_stock_adjustments_report_resulting_level() {
        crate::logging::init_test();
        let mut f = Fixture::new();
        let id = f.add(0, 1, 5, None);

        let removed = f.ledger.add_stock(id, -3).unwrap().unwrap();
        assert_eq!(removed.association.stock, 2);
        assert_eq!(f.stored(id).stock, 2);

        assert!(matches!(f.ledger.add_stock(id, -3), Err(Error::InvalidStockLevel(-1))));
        assert_eq!(f.stored(id).stock, 2);

        assert!(f.ledger.set_stock(99, 10).unwrap().is_none());
    }

    #[test]
    fn test_actions_refreshed_after_mutation() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 20, Some(days_ago(1)));

        let before = f.ledger.get(id).unwrap().unwrap();
        assert_eq!(before.actions, vec![MedicationAction::TakeDose]);

        let after = f.ledger.decrement(id, 1).unwrap().unwrap();
        assert!(after.actions.is_empty());

        let low = f.ledger.set_stock(id, 3).unwrap().unwrap();
        assert_eq!(low.actions, vec![MedicationAction::OrderMore]);
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    #[test]
    fn test_decrement_all_only_touches_due_associations() {
        let mut f = Fixture::new();
        let stale = f.add(0, 1, 10, Some(days_ago(2)));
        let current = f.add(1, 1, 10, Some(today()));
        let unset = f.add(2, 2, 10, None);

        let updated = f.ledger.decrement_all(f.person_id, 1).unwrap();

        let ids: Vec<_> = updated.iter().map(|t| t.association.id).collect();
        assert_eq!(ids, vec![stale, unset]);
        assert_eq!(f.stored(stale).stock, 9);
        assert_eq!(f.stored(stale).last_taken, Some(days_ago(1)));
        assert_eq!(f.stored(current).stock, 10);
        assert_eq!(f.stored(current).last_taken, Some(today()));
        assert_eq!(f.stored(unset).stock, 8);
        assert_eq!(f.stored(unset).last_taken, Some(today()));
    }

    #[test]
    fn test_decrement_all_twice_in_a_day_does_not_double_dose() {
        let mut f = Fixture::new();
        let id = f.add(0, 1, 10, Some(days_ago(1)));

        f.ledger.decrement_all(f.person_id, 1).unwrap();
        let second = f.ledger.decrement_all(f.person_id, 1).unwrap();

        assert!(second.is_empty());
        assert_eq!(f.stored(id).stock, 9);
    }

    #[test]
    fn test_decrement_all_is_not_transactional() {
        let mut f = Fixture::new();
        let first = f.add(0, 1, 10, Some(days_ago(5)));
        let second = f.add(1, 1, 10, Some(days_ago(1)));

        let result = f.ledger.decrement_all(f.person_id, 3);

        assert!(matches!(result, Err(Error::StockDateOutOfRange(_))));
        assert_eq!(f.stored(first).stock, 7);
        assert_eq!(f.stored(first).last_taken, Some(days_ago(2)));
        assert_eq!(f.stored(second).stock, 10);
        assert_eq!(f.stored(second).last_taken, Some(days_ago(1)));
    }

    #[test]
    fn test_increment_all_has_no_date_guard() {
        let mut f = Fixture::new();
        let current = f.add(0, 1, 0, Some(today()));
        let unset = f.add(1, 1, 0, None);

        let updated = f.ledger.increment_all(f.person_id, 2).unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(f.stored(current).stock, 2);
        assert_eq!(f.stored(current).last_taken, Some(days_ago(2)));
        assert_eq!(f.stored(unset).stock, 2);
        assert_eq!(f.stored(unset).last_taken, Some(today()));
    }

    #[test]
    fn test_skip_all_aborts_on_current_ledger() {
        let mut f = Fixture::new();
        let stale = f.add(0, 1, 5, Some(days_ago(1)));
        let current = f.add(1, 1, 5, Some(today()));

        let result = f.ledger.skip_all(f.person_id);

        assert!(matches!(result, Err(Error::StockDateOutOfRange(_))));
        assert_eq!(f.stored(stale).last_taken, Some(today()));
        assert_eq!(f.stored(current).last_taken, Some(today()));
    }

    #[test]
    fn test_fast_forward_all() {
        let mut f = Fixture::new();
        let a = f.add(0, 1, 10, Some(days_ago(4)));
        let b = f.add(1, 2, 10, Some(days_ago(1)));
        let c = f.add(2, 1, 10, Some(today()));

        let updated = f.ledger.fast_forward_all(f.person_id).unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(f.stored(a).stock, 6);
        assert_eq!(f.stored(b).stock, 8);
        assert_eq!(f.stored(c).stock, 10);
        for id in [a, b, c] {
            assert_eq!(f.stored(id).last_taken, Some(today()));
        }
    }

    #[test]
    fn test_bulk_ignores_other_people() {
        let mut f = Fixture::new();
        let other = f
            .ledger
            .store_mut()
            .add_person("Alan", "Turing", NaiveDate::from_ymd_opt(1954, 6, 7).unwrap())
            .unwrap()
            .id;
        let medication_id = f.medication_ids[0];
        let theirs = f
            .ledger
            .store_mut()
            .add(other, medication_id, 1, 10, Some(days_ago(3)))
            .unwrap()
            .id;

        f.ledger.fast_forward_all(f.person_id).unwrap();
        assert_eq!(f.stored(theirs).stock, 10);
    }

    #[test]
    fn test_clock_advance_makes_association_due() {
        let clock = FixedClock::new(today());
        let mut store = MemoryStore::new(clock.clone());
        let person = store
            .add_person("Ada", "Lovelace", NaiveDate::from_ymd_opt(1980, 12, 10).unwrap())
            .unwrap();
        let medication = store.add_medication("Atorvastatin").unwrap();
        let id = store.add(person.id, medication.id, 1, 10, Some(today())).unwrap().id;
        let mut ledger = StockLedger::new(store, clock.clone(), ActionGenerator::new(LEAD_TIME));

        assert!(ledger.decrement_all(person.id, 1).unwrap().is_empty());

        clock.advance_days(2);
        let updated = ledger.fast_forward_all(person.id).unwrap();

        assert_eq!(updated[0].association.stock, 8);
        assert_eq!(updated[0].association.last_taken, Some(clock.today()));
        assert_eq!(ledger.get(id).unwrap().unwrap().association.stock, 8);
    }

    #[test]
    fn test_ledger_over_file_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("medstock.json");
        let clock = FixedClock::new(today());

        let mut store = FileStore::new(&path, clock.clone());
        let person = store
            .add_person("Ada", "Lovelace", NaiveDate::from_ymd_opt(1980, 12, 10).unwrap())
            .unwrap();
        let medication = store.add_medication("Atorvastatin").unwrap();
        let id = store.add(person.id, medication.id, 2, 20, Some(days_ago(2))).unwrap().id;

        let mut ledger = StockLedger::new(store, clock.clone(), ActionGenerator::new(LEAD_TIME));
        ledger.fast_forward(id).unwrap();
        assert!(ledger.skip(id).is_err());

        let reopened = FileStore::new(&path, clock);
        let stored = reopened.get(id).unwrap().unwrap();
        assert_eq!(stored.stock, 16);
        assert_eq!(stored.last_taken, Some(today()));
    }
}
