//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use authenticator_core::{Authenticator, ConfigIndex, MemoryStore, Secret, SecretStore, StoreError};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Set,
    Delete,
}

/// A [`MemoryStore`] that counts calls and fails on demand.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failures: Mutex<HashSet<(Op, String)>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `op` on `key` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, op: Op, key: &str) {
        self.failures.lock().insert((op, key.to_string()));
    }

    pub fn heal(&self, op: Op, key: &str) {
        self.failures.lock().remove(&(op, key.to_string()));
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, service: &str, key: &str) -> bool {
        self.inner.exists(service, key).unwrap_or(false)
    }

    fn check(&self, op: Op, key: &str) -> Result<(), StoreError> {
        if self.failures.lock().contains(&(op, key.to_string())) {
            return Err(StoreError::BackendError {
                message: format!("injected {:?} failure for {}", op, key),
            });
        }
        Ok(())
    }
}

impl SecretStore for FaultyStore {
    fn get(&self, service: &str, key: &str) -> Result<Secret, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check(Op::Get, key)?;
        self.inner.get(service, key)
    }

    fn set(&self, service: &str, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check(Op::Set, key)?;
        self.inner.set(service, key, secret)
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check(Op::Delete, key)?;
        self.inner.delete(service, key)
    }
}

/// An authenticator over a fresh [`FaultyStore`] and a temporary index file.
pub fn test_authenticator() -> (Authenticator, Arc<FaultyStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FaultyStore::new();
    let index = ConfigIndex::at(temp_dir.path().join("authenticator.toml"));
    let authenticator = Authenticator::new(store.clone(), index);
    (authenticator, store, temp_dir)
}

/// An authenticator whose index file can never be written.
pub fn unwritable_index_authenticator() -> (Authenticator, Arc<FaultyStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FaultyStore::new();
    let index = ConfigIndex::at(temp_dir.path().join("missing-dir").join("authenticator.toml"));
    let authenticator = Authenticator::new(store.clone(), index);
    (authenticator, store, temp_dir)
}
