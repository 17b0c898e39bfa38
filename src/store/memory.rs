//! In-process thread store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{SharedPost, StoreFactory, ThreadStore};
use crate::core::models::IntermediatePost;
use crate::error::Result;

/// Thread store backed by a `HashMap`.
///
/// Everything stored is part of the change set; nothing outlives the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    threads: HashMap<String, SharedPost>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl ThreadStore for MemoryStore {
    fn has_thread(&mut self, thread_id: &str) -> Result<bool> {
        Ok(self.threads.contains_key(thread_id))
    }

    fn lookup_thread(&mut self, thread_id: &str) -> Result<Option<SharedPost>> {
        Ok(self.threads.get(thread_id).cloned())
    }

    fn store_thread(&mut self, thread_id: &str, post: IntermediatePost) -> SharedPost {
        let shared = Rc::new(RefCell::new(post));
        self.threads.insert(thread_id.to_string(), Rc::clone(&shared));
        shared
    }

    fn changed_threads(&self) -> Vec<SharedPost> {
        self.threads.values().cloned().collect()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens a fresh [`MemoryStore`] for every channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn open(&mut self, _channel: &str) -> Result<Box<dyn ThreadStore>> {
        Ok(Box::new(MemoryStore::new()))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
