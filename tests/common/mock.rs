//! In-memory class sources for integration tests.
#![allow(dead_code)]

use squid_bytecode::domain::ports::ClassSource;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Class bytes held in memory, keyed by internal name.
#[derive(Default)]
pub struct MemorySource {
    classes: BTreeMap<String, Vec<u8>>,
    lookups: AtomicUsize,
}

impl MemorySource {
    pub fn new<I>(classes: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Self {
            classes: classes.into_iter().collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.classes.insert(name.to_string(), bytes);
    }

    /// Number of `resolve` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl ClassSource for MemorySource {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.classes.get(name).cloned()
    }

    fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }
}
