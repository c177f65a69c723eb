//! CSV import and export of medication associations.
//!
//! Rows carry the association's stored fields, keyed by person and
//! medication ID. Imports go through the association store, so every
//! validation rule applies to imported rows too.

use crate::store::ALL;
use crate::{AssociationStore, AssociationUpdate, Error, PersonMedication, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A row in the CSV file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    person_id: u32,
    medication_id: u32,
    daily_dose: i32,
    stock: i32,
    last_taken: Option<NaiveDate>,
    active: bool,
}

impl From<&PersonMedication> for CsvRow {
    fn from(association: &PersonMedication) -> Self {
        CsvRow {
            person_id: association.person_id,
            medication_id: association.medication_id,
            daily_dose: association.daily_dose,
            stock: association.stock,
            last_taken: association.last_taken,
            active: association.active,
        }
    }
}

impl From<CsvRow> for AssociationUpdate {
    fn from(row: CsvRow) -> Self {
        AssociationUpdate {
            person_id: row.person_id,
            medication_id: row.medication_id,
            daily_dose: row.daily_dose,
            stock: row.stock,
            last_taken: row.last_taken,
            active: row.active,
        }
    }
}

/// Write associations matching `filter` to a CSV file with headers
///
/// Returns the number of rows written.
pub fn export_associations<S: AssociationStore>(
    store: &S,
    filter: &dyn Fn(&PersonMedication) -> bool,
    csv_path: &Path,
) -> Result<usize> {
    let associations = store.list(filter, 1, ALL)?;

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(csv_path)?;
    for association in &associations {
        writer.serialize(CsvRow::from(association))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} associations to {:?}", associations.len(), csv_path);
    Ok(associations.len())
}

/// Add each row of a CSV file as a new association
///
/// Each row, active flag included, is stored in a single store call. Rows
/// are applied in order. The first invalid row stops the import with
/// an [`Error::Import`] naming its 1-based data row number; rows before it
/// have already been added.
pub fn import_associations<S: AssociationStore>(store: &mut S, csv_path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut count = 0;
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 1;
        let wrap = |e: Error| Error::Import {
            row: row_number,
            source: Box::new(e),
        };

        let row = result.map_err(|e| wrap(Error::Csv(e)))?;
        let added = store.insert(&AssociationUpdate::from(row)).map_err(wrap)?;

        tracing::debug!("Imported association {} from row {}", added.id, row_number);
        count += 1;
    }

    tracing::info!("Imported {} associations from {:?}", count, csv_path);
    Ok(count)
}
