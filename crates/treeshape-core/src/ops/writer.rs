use super::store::Store;
use crate::errors::Result;
use crate::model::{RawData, Record, Status};

/// Write-side collaborator that applies reconciliation operations
pub trait StorageWriter {
    /// # Errors
    ///
    /// Returns an error if the data cannot be stored.
    fn create(&mut self, data: &RawData) -> Result<Record>;

    /// Partial update: only the submitted fields change
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` or a decoding error.
    fn update(&mut self, key: i64, data: &RawData) -> Result<Record>;

    /// # Errors
    ///
    /// Returns `RecordNotFound` if the record does not exist.
    fn soft_delete(&mut self, key: i64) -> Result<()>;
}

/// [`StorageWriter`] over one entity table of a [`Store`]
#[derive(Debug)]
pub struct EntityWriter<'s> {
    store: &'s mut Store,
    entity: String,
}

impl<'s> EntityWriter<'s> {
    pub(crate) fn new(store: &'s mut Store, entity: impl Into<String>) -> Self {
        Self {
            store,
            entity: entity.into(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl<'s> StorageWriter for EntityWriter<'s> {
    fn create(&mut self, data: &RawData) -> Result<Record> {
        let attrs = self.store.decode(&self.entity, data)?;
        let key = self.store.next_key(&self.entity)?;
        let mut record = Record::new(self.entity.clone(), key);
        record.attrs = attrs;
        self.store.insert_record(record.clone())?;
        Ok(record)
    }

    fn update(&mut self, key: i64, data: &RawData) -> Result<Record> {
        let attrs = self.store.decode(&self.entity, data)?;
        let record = self.store.get_record_mut(&self.entity, key)?;
        record.attrs.extend(attrs);
        Ok(record.clone())
    }

    fn soft_delete(&mut self, key: i64) -> Result<()> {
        let record = self.store.get_record_mut(&self.entity, key)?;
        record.status = Status::SoftDeleted;
        Ok(())
    }
}
