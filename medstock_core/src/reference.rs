//! People and medications.
//!
//! These are the records an association points at. The stock ledger only
//! needs them to exist; the rules here keep the reference data tidy enough
//! for the association store's existence and in-use checks.

use crate::{Error, HealthData, Medication, Person, Result};
use chrono::NaiveDate;

/// Management of the reference data behind associations
pub trait ReferenceStore {
    fn add_person(&mut self, first_names: &str, surname: &str, date_of_birth: NaiveDate) -> Result<Person>;
    fn list_people(&self) -> Result<Vec<Person>>;
    fn delete_person(&mut self, id: u32) -> Result<()>;

    fn add_medication(&mut self, name: &str) -> Result<Medication>;
    fn rename_medication(&mut self, id: u32, name: &str) -> Result<Option<Medication>>;
    fn list_medications(&self) -> Result<Vec<Medication>>;
    fn delete_medication(&mut self, id: u32) -> Result<()>;
}

/// Trim and collapse internal whitespace
pub fn clean_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl HealthData {
    pub fn person(&self, id: u32) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn medication(&self, id: u32) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == id)
    }

    pub(crate) fn add_person(
        &mut self,
        today: NaiveDate,
        first_names: &str,
        surname: &str,
        date_of_birth: NaiveDate,
    ) -> Result<Person> {
        tracing::info!(
            "Adding person: '{} {}', DoB {}",
            first_names,
            surname,
            date_of_birth
        );

        let first_names = clean_name(first_names);
        let surname = clean_name(surname);
        if first_names.is_empty() || surname.is_empty() {
            return Err(Error::InvalidPerson("first names and surname are required".into()));
        }
        if date_of_birth > today {
            return Err(Error::InvalidPerson(format!(
                "date of birth {} is in the future",
                date_of_birth
            )));
        }

        let person = Person {
            id: self.next_person_id(),
            first_names,
            surname,
            date_of_birth,
        };
        self.people.push(person.clone());
        Ok(person)
    }

    pub(crate) fn list_people(&self) -> Vec<Person> {
        let mut people = self.people.clone();
        people.sort_by(|a, b| (&a.surname, &a.first_names).cmp(&(&b.surname, &b.first_names)));
        people
    }

    pub(crate) fn delete_person(&mut self, id: u32) -> Result<()> {
        tracing::info!("Deleting person with ID {}", id);

        if self.associations.iter().any(|a| a.person_id == id) {
            return Err(Error::PersonInUse(id));
        }
        self.people.retain(|p| p.id != id);
        Ok(())
    }

    fn find_medication_by_name(&self, name: &str, exclude_id: Option<u32>) -> Option<&Medication> {
        self.medications
            .iter()
            .filter(|m| Some(m.id) != exclude_id)
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn add_medication(&mut self, name: &str) -> Result<Medication> {
        tracing::info!("Adding medication '{}'", name);

        let clean = clean_name(name);
        if clean.is_empty() {
            return Err(Error::Other("medication name is required".into()));
        }
        if self.find_medication_by_name(&clean, None).is_some() {
            return Err(Error::DuplicateMedication(clean));
        }

        let medication = Medication {
            id: self.next_medication_id(),
            name: clean,
        };
        self.medications.push(medication.clone());
        Ok(medication)
    }

    pub(crate) fn rename_medication(&mut self, id: u32, name: &str) -> Result<Option<Medication>> {
        tracing::info!("Updating medication with ID {} to '{}'", id, name);

        let clean = clean_name(name);
        if clean.is_empty() {
            return Err(Error::Other("medication name is required".into()));
        }
        if self.find_medication_by_name(&clean, Some(id)).is_some() {
            return Err(Error::DuplicateMedication(clean));
        }

        Ok(self.medications.iter_mut().find(|m| m.id == id).map(|m| {
            m.name = clean;
            m.clone()
        }))
    }

    pub(crate) fn list_medications(&self) -> Vec<Medication> {
        let mut medications = self.medications.clone();
        medications.sort_by(|a, b| a.name.cmp(&b.name));
        medications
    }

    pub(crate) fn delete_medication(&mut self, id: u32) -> Result<()> {
        tracing::info!("Deleting medication with ID {}", id);

        let Some(medication) = self.medication(id) else {
            return Ok(());
        };
        if self.associations.iter().any(|a| a.medication_id == id) {
            return Err(Error::MedicationInUse {
                id,
                name: medication.name.clone(),
            });
        }
        self.medications.retain(|m| m.id != id);
        Ok(())
    }
}
