//! Error types for the medstock_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medstock_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Daily dose was zero or negative
    #[error("{0} is not a valid daily medication dose")]
    InvalidDose(i32),

    /// Stock level was negative
    #[error("{0} is not a valid medication stock level")]
    InvalidStockLevel(i32),

    /// Supplied "last taken" date lies in the future
    #[error("{0} is not valid as a last taken date")]
    InvalidDoseDate(NaiveDate),

    /// A ledger calculation would move the stock date past today
    #[error("Stock date {0} is in the future")]
    StockDateOutOfRange(NaiveDate),

    /// The person already has an association with the medication
    #[error("Medication with ID {medication_id} is already associated with person with ID {person_id}")]
    DuplicateAssociation { person_id: u32, medication_id: u32 },

    #[error("Person with ID {0} does not exist")]
    PersonNotFound(u32),

    #[error("Medication with ID {0} does not exist")]
    MedicationNotFound(u32),

    /// Person details failed validation
    #[error("Invalid person: {0}")]
    InvalidPerson(String),

    #[error("Medication '{0}' already exists")]
    DuplicateMedication(String),

    /// Person still has medication associations
    #[error("Person with ID {0} has medication associations and cannot be deleted")]
    PersonInUse(u32),

    /// Medication is still associated with a person
    #[error("Medication '{name}' with ID {id} is in use and cannot be deleted")]
    MedicationInUse { id: u32, name: String },

    /// CSV import rejected a row
    #[error("Import failed at row {row}: {source}")]
    Import {
        row: usize,
        #[source]
        source: Box<Error>,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
