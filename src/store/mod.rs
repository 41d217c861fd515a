//! Accès aux données : tables `duties` et `swap_requests` du document [`Roster`].
//!
//! Les deux interfaces ([`DutyStore`], [`SwapRequestStore`]) sont implémentées sur le
//! roster de travail d'une transaction ; [`Repository::transaction`] ne sauvegarde que
//! si la closure réussit, ce qui rend atomiques les lots et les échanges multi-lignes.

mod duty;
mod swap;

pub use duty::DutyStore;
pub use swap::SwapRequestStore;

use crate::error::Entity;
use crate::model::{DutyId, Roster};
use crate::storage::Storage;
use anyhow::anyhow;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("pending swap request already exists for {source_duty} -> {target_duty}")]
    DuplicatePending {
        source_duty: DutyId,
        target_duty: DutyId,
    },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: Entity, id: impl ToString) -> Self {
        StoreError::NotFound { entity, id: id.to_string() }
    }
}

/// Enveloppe transactionnelle autour d'un [`Storage`].
///
/// Les transactions sont sérialisées par un mutex dans le processus et par
/// [`Storage::lock`] entre processus : une lecture concurrente ne voit jamais un état
/// intermédiaire, deux écritures concurrentes ne s'écrasent pas.
pub struct Repository<S: Storage> {
    storage: Mutex<S>,
}

impl<S: Storage> Repository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage: Mutex::new(storage) }
    }

    /// Exécute `f` sur une copie de travail ; sauvegarde seulement si `f` retourne `Ok`.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Roster) -> Result<T, E>,
        E: From<StoreError>,
    {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("storage lock poisoned")))?;
        let _guard = storage.lock().map_err(StoreError::Backend)?;
        let mut roster = storage.load().map_err(StoreError::Backend)?;
        let out = f(&mut roster)?;
        storage.save(&roster).map_err(StoreError::Backend)?;
        Ok(out)
    }

    /// Lecture seule : aucune sauvegarde.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Roster) -> Result<T, E>,
        E: From<StoreError>,
    {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("storage lock poisoned")))?;
        let _guard = storage.lock().map_err(StoreError::Backend)?;
        let roster = storage.load().map_err(StoreError::Backend)?;
        f(&roster)
    }

    /// Accès direct au support (inspection en test, export).
    pub fn with_storage<T>(&self, f: impl FnOnce(&S) -> T) -> Result<T, StoreError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("storage lock poisoned")))?;
        Ok(f(&storage))
    }
}
