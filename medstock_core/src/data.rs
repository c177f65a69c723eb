//! Data file persistence with file locking.
//!
//! All people, medications and associations live in a single JSON snapshot.
//! Writes go through a temp file and an atomic rename, and each
//! load-modify-save cycle holds an exclusive lock on a sibling lock file so
//! concurrent processes cannot interleave inside one call.

use crate::{Error, Medication, Person, PersonMedication, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default file name for the data snapshot inside the data directory
pub const DATA_FILE_NAME: &str = "medstock.json";

/// Last identifiers handed out for each record type
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Sequences {
    pub person: u32,
    pub medication: u32,
    pub association: u32,
}

/// Complete persisted dataset
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HealthData {
    #[serde(default)]
    pub people: Vec<Person>,

    #[serde(default)]
    pub medications: Vec<Medication>,

    #[serde(default)]
    pub associations: Vec<PersonMedication>,

    #[serde(default)]
    pub sequences: Sequences,
}

impl HealthData {
    pub(crate) fn next_person_id(&mut self) -> u32 {
        self.sequences.person += 1;
        self.sequences.person
    }

    pub(crate) fn next_medication_id(&mut self) -> u32 {
        self.sequences.medication += 1;
        self.sequences.medication
    }

    pub(crate) fn next_association_id(&mut self) -> u32 {
        self.sequences.association += 1;
        self.sequences.association
    }

    /// Load the dataset from a file with shared locking
    ///
    /// Returns an empty dataset if the file doesn't exist. A file that
    /// exists but cannot be parsed is an error: silently starting over would
    /// discard the stock ledger on the next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No data file found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let data: HealthData = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse data file {:?}: {}", path, e);
            Error::Json(e)
        })?;

        tracing::debug!(
            "Loaded {} people, {} medications, {} associations from {:?}",
            data.people.len(),
            data.medications.len(),
            data.associations.len(),
            path
        );
        Ok(data)
    }

    /// Save the dataset to a file
    ///
    /// Atomically writes data by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "data path missing parent"))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved data to {:?}", path);
        Ok(())
    }

    /// Load the dataset, modify it, and save it back under an exclusive lock
    ///
    /// Nothing is written if `f` fails.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut HealthData) -> Result<T>,
    {
        let lock = acquire_lock(path)?;

        let result = (|| {
            let mut data = Self::load(path)?;
            let value = f(&mut data)?;
            data.save(path)?;
            Ok(value)
        })();

        lock.unlock()?;
        result
    }

    /// Load the dataset and read from it under the same lock writers use
    pub fn read<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&HealthData) -> Result<T>,
    {
        let lock = acquire_lock(path)?;
        let result = Self::load(path).and_then(|data| f(&data));
        lock.unlock()?;
        result
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

fn acquire_lock(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;
    Ok(lock)
}
