//! Thread store with a local write cache in front of a remote key-value backend.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use super::{SharedPost, StoreFactory, ThreadStore};
use crate::core::models::IntermediatePost;
use crate::error::Result;

/// Minimal key-value operations the cached store needs from its backend.
pub trait RemoteBackend {
    /// Fetches the value under `key`.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Returns `true` if `key` exists.
    fn exists(&mut self, key: &str) -> Result<bool>;

    /// Writes all entries; values never expire.
    fn set_many(&mut self, entries: &[(String, String)]) -> Result<()>;
}

/// Thread store that caches posts locally and persists them on [`flush`](ThreadStore::flush).
///
/// Keys in the backend are `<channel>:<thread id>`, so stores for different
/// channels never collide. The local cache holds exactly the change set:
/// posts stored here and posts fetched by a lookup. Posts that exist in the
/// backend but were never touched by this instance are not part of it.
pub struct CachedStore<B> {
    backend: B,
    namespace: String,
    local: HashMap<String, SharedPost>,
}

impl<B: RemoteBackend> CachedStore<B> {
    pub fn new(backend: B, channel: &str) -> Self {
        Self {
            backend,
            namespace: channel.to_string(),
            local: HashMap::new(),
        }
    }

    fn key(&self, thread_id: &str) -> String {
        format!("{}:{}", self.namespace, thread_id)
    }
}

impl<B: RemoteBackend> ThreadStore for CachedStore<B> {
    fn has_thread(&mut self, thread_id: &str) -> Result<bool> {
        if self.local.contains_key(thread_id) {
            return Ok(true);
        }
        let key = self.key(thread_id);
        self.backend.exists(&key)
    }

    fn lookup_thread(&mut self, thread_id: &str) -> Result<Option<SharedPost>> {
        if let Some(post) = self.local.get(thread_id) {
            return Ok(Some(Rc::clone(post)));
        }

        let key = self.key(thread_id);
        let Some(json) = self.backend.get(&key)? else {
            return Ok(None);
        };
        debug!("Fetched thread {} from the remote store", key);

        let post: IntermediatePost = serde_json::from_str(&json)?;
        let shared = Rc::new(RefCell::new(post));
        self.local.insert(thread_id.to_string(), Rc::clone(&shared));
        Ok(Some(shared))
    }

    fn store_thread(&mut self, thread_id: &str, post: IntermediatePost) -> SharedPost {
        let shared = Rc::new(RefCell::new(post));
        self.local.insert(thread_id.to_string(), Rc::clone(&shared));
        shared
    }

    fn changed_threads(&self) -> Vec<SharedPost> {
        self.local.values().cloned().collect()
    }

    fn flush(&mut self) -> Result<()> {
        let entries = self
            .local
            .iter()
            .map(|(thread_id, post)| -> Result<(String, String)> {
                let json = serde_json::to_string(&*post.borrow())?;
                Ok((self.key(thread_id), json))
            })
            .collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            return Ok(());
        }
        debug!(
            "Writing {} threads of channel {} to the remote store",
            entries.len(),
            self.namespace
        );
        self.backend.set_many(&entries)
    }
}

/// In-process [`RemoteBackend`]; clones share one map.
///
/// Behaves like a remote store shared by several store instances, without a
/// server. Useful for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MapBackend {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl RemoteBackend for MapBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.borrow().contains_key(key))
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> Result<()> {
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Opens a [`CachedStore`] per channel over clones of one backend.
#[derive(Debug, Clone)]
pub struct CachedStoreFactory<B> {
    backend: B,
}

impl<B> CachedStoreFactory<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: RemoteBackend + Clone + 'static> StoreFactory for CachedStoreFactory<B> {
    fn open(&mut self, channel: &str) -> Result<Box<dyn ThreadStore>> {
        Ok(Box::new(CachedStore::new(self.backend.clone(), channel)))
    }

    fn describe(&self) -> String {
        "cached (in-process backend)".to_string()
    }
}
