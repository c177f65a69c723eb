//! Association store: CRUD and validation for person/medication pairings.
//!
//! The stock ledger never touches storage directly; it reads and writes
//! through [`AssociationStore`]. Two implementations are provided:
//! - [`MemoryStore`] keeps the dataset in memory (tests, embedding)
//! - [`FileStore`] applies each call to the JSON data file under a lock

use crate::reference::ReferenceStore;
use crate::{Clock, Error, HealthData, Medication, Person, PersonMedication, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Page size that returns every matching association
pub const ALL: usize = usize::MAX;

/// Every editable field of an association
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationUpdate {
    pub person_id: u32,
    pub medication_id: u32,
    pub daily_dose: i32,
    pub stock: i32,
    pub last_taken: Option<NaiveDate>,
    pub active: bool,
}

/// Storage seam used by the stock ledger
///
/// Operations addressing a missing association id return `Ok(None)`;
/// callers are expected to have found the id via [`list`](Self::list).
pub trait AssociationStore {
    /// Associations matching `filter`, ordered by person then medication,
    /// with 1-based page numbers
    fn list(
        &self,
        filter: &dyn Fn(&PersonMedication) -> bool,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<PersonMedication>>;

    /// Create an association with the given fields, including its active flag
    fn insert(&mut self, record: &AssociationUpdate) -> Result<PersonMedication>;

    fn update(&mut self, id: u32, update: &AssociationUpdate) -> Result<Option<PersonMedication>>;

    fn set_active(&mut self, id: u32, active: bool) -> Result<Option<PersonMedication>>;

    fn set_dose(&mut self, id: u32, daily_dose: i32) -> Result<Option<PersonMedication>>;

    /// Set the stock level, leaving the ledger date alone
    fn set_stock(&mut self, id: u32, stock: i32) -> Result<Option<PersonMedication>>;

    /// Set the stock level and the ledger date together
    fn set_stock_and_date(
        &mut self,
        id: u32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<Option<PersonMedication>>;

    fn add_stock(&mut self, id: u32, tablets: i32) -> Result<Option<PersonMedication>>;

    fn delete(&mut self, id: u32) -> Result<()>;

    /// Create an active association
    fn add(
        &mut self,
        person_id: u32,
        medication_id: u32,
        daily_dose: i32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<PersonMedication> {
        self.insert(&AssociationUpdate {
            person_id,
            medication_id,
            daily_dose,
            stock,
            last_taken,
            active: true,
        })
    }

    fn get(&self, id: u32) -> Result<Option<PersonMedication>> {
        Ok(self.list(&|a| a.id == id, 1, ALL)?.into_iter().next())
    }

    fn activate(&mut self, id: u32) -> Result<Option<PersonMedication>> {
        self.set_active(id, true)
    }

    fn deactivate(&mut self, id: u32) -> Result<Option<PersonMedication>> {
        self.set_active(id, false)
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_dose(daily_dose: i32) -> Result<()> {
    if daily_dose <= 0 {
        return Err(Error::InvalidDose(daily_dose));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(Error::InvalidStockLevel(stock));
    }
    Ok(())
}

fn validate_last_taken(last_taken: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    match last_taken {
        Some(taken) if taken > today => Err(Error::InvalidDoseDate(taken)),
        _ => Ok(()),
    }
}

fn describe_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "null".to_string(), |d| d.to_string())
}

// ============================================================================
// Dataset operations
// ============================================================================

impl HealthData {
    fn check_duplicate_pair(&self, person_id: u32, medication_id: u32, exclude_id: Option<u32>) -> Result<()> {
        let duplicate = self.associations.iter().any(|a| {
            a.person_id == person_id && a.medication_id == medication_id && Some(a.id) != exclude_id
        });
        if duplicate {
            return Err(Error::DuplicateAssociation {
                person_id,
                medication_id,
            });
        }
        Ok(())
    }

    fn validate_association(
        &self,
        today: NaiveDate,
        person_id: u32,
        medication_id: u32,
        daily_dose: i32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<()> {
        if self.person(person_id).is_none() {
            return Err(Error::PersonNotFound(person_id));
        }
        if self.medication(medication_id).is_none() {
            return Err(Error::MedicationNotFound(medication_id));
        }
        validate_dose(daily_dose)?;
        validate_stock(stock)?;
        validate_last_taken(last_taken, today)
    }

    fn association_mut(&mut self, id: u32) -> Option<&mut PersonMedication> {
        self.associations.iter_mut().find(|a| a.id == id)
    }

    pub(crate) fn list_associations(
        &self,
        filter: &dyn Fn(&PersonMedication) -> bool,
        page: usize,
        page_size: usize,
    ) -> Vec<PersonMedication> {
        if page == 0 || page_size == 0 {
            return Vec::new();
        }

        let mut matches: Vec<_> = self.associations.iter().filter(|a| filter(a)).cloned().collect();
        matches.sort_by_key(|a| (a.person_id, a.medication_id));

        matches
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect()
    }

    pub(crate) fn add_association(&mut self, today: NaiveDate, record: &AssociationUpdate) -> Result<PersonMedication> {
        tracing::info!(
            "Adding medication association: Person ID {}, Medication ID {}, Daily Dose {}, Stock level {}, Last Taken {}, Active {}",
            record.person_id,
            record.medication_id,
            record.daily_dose,
            record.stock,
            describe_date(record.last_taken),
            record.active
        );

        self.check_duplicate_pair(record.person_id, record.medication_id, None)?;
        self.validate_association(
            today,
            record.person_id,
            record.medication_id,
            record.daily_dose,
            record.stock,
            record.last_taken,
        )?;

        let association = PersonMedication {
            id: self.next_association_id(),
            person_id: record.person_id,
            medication_id: record.medication_id,
            daily_dose: record.daily_dose,
            stock: record.stock,
            last_taken: record.last_taken,
            active: record.active,
        };
        self.associations.push(association.clone());
        Ok(association)
    }

    pub(crate) fn update_association(
        &mut self,
        today: NaiveDate,
        id: u32,
        update: &AssociationUpdate,
    ) -> Result<Option<PersonMedication>> {
        tracing::info!(
            "Updating medication association with ID {}: Person ID {}, Medication ID {}, Daily Dose {}, Stock level {}, Last Taken {}, Active {}",
            id,
            update.person_id,
            update.medication_id,
            update.daily_dose,
            update.stock,
            describe_date(update.last_taken),
            update.active
        );

        self.check_duplicate_pair(update.person_id, update.medication_id, Some(id))?;
        self.validate_association(
            today,
            update.person_id,
            update.medication_id,
            update.daily_dose,
            update.stock,
            update.last_taken,
        )?;

        Ok(self.association_mut(id).map(|a| {
            a.person_id = update.person_id;
            a.medication_id = update.medication_id;
            a.daily_dose = update.daily_dose;
            a.stock = update.stock;
            a.last_taken = update.last_taken;
            a.active = update.active;
            a.clone()
        }))
    }

    pub(crate) fn set_association_active(&mut self, id: u32, active: bool) -> Option<PersonMedication> {
        tracing::info!("Setting active status for medication association with ID {}: {}", id, active);

        self.association_mut(id).map(|a| {
            a.active = active;
            a.clone()
        })
    }

    pub(crate) fn set_association_dose(&mut self, id: u32, daily_dose: i32) -> Result<Option<PersonMedication>> {
        tracing::info!("Setting the daily dose for medication association with ID {} to {}", id, daily_dose);

        validate_dose(daily_dose)?;
        Ok(self.association_mut(id).map(|a| {
            a.daily_dose = daily_dose;
            a.clone()
        }))
    }

    pub(crate) fn set_association_stock(&mut self, id: u32, stock: i32) -> Result<Option<PersonMedication>> {
        tracing::info!("Setting the stock level for medication association with ID {} to {}", id, stock);

        validate_stock(stock)?;
        Ok(self.association_mut(id).map(|a| {
            a.stock = stock;
            a.clone()
        }))
    }

    pub(crate) fn set_association_stock_and_date(
        &mut self,
        today: NaiveDate,
        id: u32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<Option<PersonMedication>> {
        tracing::info!(
            "Setting the stock level for medication association with ID {} to {}, last taken on {}",
            id,
            stock,
            describe_date(last_taken)
        );

        validate_stock(stock)?;
        validate_last_taken(last_taken, today)?;
        Ok(self.association_mut(id).map(|a| {
            a.stock = stock;
            a.last_taken = last_taken;
            a.clone()
        }))
    }

    pub(crate) fn add_association_stock(&mut self, id: u32, tablets: i32) -> Result<Option<PersonMedication>> {
        tracing::info!("Adding {} to the stock level for medication association with ID {}", tablets, id);

        let Some(association) = self.association_mut(id) else {
            return Ok(None);
        };
        let updated = association
            .stock
            .checked_add(tablets)
            .ok_or_else(|| Error::Other(format!("stock overflow adding {} tablets", tablets)))?;
        validate_stock(updated)?;

        tracing::info!("Stock level will be updated from {} to {}", association.stock, updated);
        association.stock = updated;
        Ok(Some(association.clone()))
    }

    pub(crate) fn delete_association(&mut self, id: u32) {
        tracing::info!("Deleting the medication association with ID {}", id);
        self.associations.retain(|a| a.id != id);
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store holding the dataset in memory
#[derive(Debug, Clone)]
pub struct MemoryStore<C: Clock> {
    data: HealthData,
    clock: C,
}

impl<C: Clock> MemoryStore<C> {
    pub fn new(clock: C) -> Self {
        Self::with_data(HealthData::default(), clock)
    }

    pub fn with_data(data: HealthData, clock: C) -> Self {
        Self { data, clock }
    }

    pub fn data(&self) -> &HealthData {
        &self.data
    }
}

impl<C: Clock> AssociationStore for MemoryStore<C> {
    fn list(
        &self,
        filter: &dyn Fn(&PersonMedication) -> bool,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<PersonMedication>> {
        Ok(self.data.list_associations(filter, page, page_size))
    }

    fn insert(&mut self, record: &AssociationUpdate) -> Result<PersonMedication> {
        let today = self.clock.today();
        self.data.add_association(today, record)
    }

    fn update(&mut self, id: u32, update: &AssociationUpdate) -> Result<Option<PersonMedication>> {
        let today = self.clock.today();
        self.data.update_association(today, id, update)
    }

    fn set_active(&mut self, id: u32, active: bool) -> Result<Option<PersonMedication>> {
        Ok(self.data.set_association_active(id, active))
    }

    fn set_dose(&mut self, id: u32, daily_dose: i32) -> Result<Option<PersonMedication>> {
        self.data.set_association_dose(id, daily_dose)
    }

    fn set_stock(&mut self, id: u32, stock: i32) -> Result<Option<PersonMedication>> {
        self.data.set_association_stock(id, stock)
    }

    fn set_stock_and_date(
        &mut self,
        id: u32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<Option<PersonMedication>> {
        let today = self.clock.today();
        self.data
            .set_association_stock_and_date(today, id, stock, last_taken)
    }

    fn add_stock(&mut self, id: u32, tablets: i32) -> Result<Option<PersonMedication>> {
        self.data.add_association_stock(id, tablets)
    }

    fn delete(&mut self, id: u32) -> Result<()> {
        self.data.delete_association(id);
        Ok(())
    }
}

impl<C: Clock> ReferenceStore for MemoryStore<C> {
    fn add_person(&mut self, first_names: &str, surname: &str, date_of_birth: NaiveDate) -> Result<Person> {
        let today = self.clock.today();
        self.data.add_person(today, first_names, surname, date_of_birth)
    }

    fn list_people(&self) -> Result<Vec<Person>> {
        Ok(self.data.list_people())
    }

    fn delete_person(&mut self, id: u32) -> Result<()> {
        self.data.delete_person(id)
    }

    fn add_medication(&mut self, name: &str) -> Result<Medication> {
        self.data.add_medication(name)
    }

    fn rename_medication(&mut self, id: u32, name: &str) -> Result<Option<Medication>> {
        self.data.rename_medication(id, name)
    }

    fn list_medications(&self) -> Result<Vec<Medication>> {
        Ok(self.data.list_medications())
    }

    fn delete_medication(&mut self, id: u32) -> Result<()> {
        self.data.delete_medication(id)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Store that applies every call to the JSON data file
///
/// Each call is a locked load-modify-save cycle. There is no transaction
/// spanning calls: two processes updating the same association race and
/// the last write wins.
#[derive(Debug, Clone)]
pub struct FileStore<C: Clock> {
    path: PathBuf,
    clock: C,
}

impl<C: Clock> FileStore<C> {
    pub fn new(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a consistent snapshot of the whole dataset
    pub fn snapshot(&self) -> Result<HealthData> {
        HealthData::read(&self.path, |data| Ok(data.clone()))
    }
}

impl<C: Clock> AssociationStore for FileStore<C> {
    fn list(
        &self,
        filter: &dyn Fn(&PersonMedication) -> bool,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<PersonMedication>> {
        HealthData::read(&self.path, |data| Ok(data.list_associations(filter, page, page_size)))
    }

    fn insert(&mut self, record: &AssociationUpdate) -> Result<PersonMedication> {
        let today = self.clock.today();
        HealthData::update(&self.path, |data| data.add_association(today, record))
    }

    fn update(&mut self, id: u32, update: &AssociationUpdate) -> Result<Option<PersonMedication>> {
        let today = self.clock.today();
        HealthData::update(&self.path, |data| data.update_association(today, id, update))
    }

    fn set_active(&mut self, id: u32, active: bool) -> Result<Option<PersonMedication>> {
        HealthData::update(&self.path, |data| Ok(data.set_association_active(id, active)))
    }

    fn set_dose(&mut self, id: u32, daily_dose: i32) -> Result<Option<PersonMedication>> {
        HealthData::update(&self.path, |data| data.set_association_dose(id, daily_dose))
    }

    fn set_stock(&mut self, id: u32, stock: i32) -> Result<Option<PersonMedication>> {
        HealthData::update(&self.path, |data| data.set_association_stock(id, stock))
    }

    fn set_stock_and_date(
        &mut self,
        id: u32,
        stock: i32,
        last_taken: Option<NaiveDate>,
    ) -> Result<Option<PersonMedication>> {
        let today = self.clock.today();
        HealthData::update(&self.path, |data| {
            data.set_association_stock_and_date(today, id, stock, last_taken)
        })
    }

    fn add_stock(&mut self, id: u32, tablets: i32) -> Result<Option<PersonMedication>> {
        HealthData::update(&self.path, |data| data.add_association_stock(id, tablets))
    }

    fn delete(&mut self, id: u32) -> Result<()> {
        HealthData::update(&self.path, |data| {
            data.delete_association(id);
            Ok(())
        })
    }
}

impl<C: Clock> ReferenceStore for FileStore<C> {
    fn add_person(&mut self, first_names: &str, surname: &str, date_of_birth: NaiveDate) -> Result<Person> {
        let today = self.clock.today();
        HealthData::update(&self.path, |data| {
            data.add_person(today, first_names, surname, date_of_birth)
        })
    }

    fn list_people(&self) -> Result<Vec<Person>> {
        HealthData::read(&self.path, |data| Ok(data.list_people()))
    }

    fn delete_person(&mut self, id: u32) -> Result<()> {
        HealthData::update(&self.path, |data| data.delete_person(id))
    }

    fn add_medication(&mut self, name: &str) -> Result<Medication> {
        HealthData::update(&self.path, |data| data.add_medication(name))
    }

    fn rename_medication(&mut self, id: u32, name: &str) -> Result<Option<Medication>> {
        HealthData::update(&self.path, |data| data.rename_medication(id, name))
    }

    fn list_medications(&self) -> Result<Vec<Medication>> {
        HealthData::read(&self.path, |data| Ok(data.list_medications()))
    }

    fn delete_medication(&mut self, id: u32) -> Result<()> {
        HealthData::update(&self.path, |data| data.delete_medication(id))
    }
}
