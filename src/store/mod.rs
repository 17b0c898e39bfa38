//! Thread stores: where roots and their replies live while a channel is assembled.
//!
//! A [`ThreadStore`] maps a thread identifier, the root's Slack `ts`, to the
//! root post of that thread. Two implementations share the trait:
//!
//! - [`MemoryStore`] keeps everything in process memory.
//! - [`CachedStore`] keeps a local write cache in front of a
//!   [`RemoteBackend`] (Redis in production), so state can outlive the
//!   process and be picked up by a later run.
//!
//! [`ThreadStore::lookup_thread`] hands out a shared, mutable handle: replies
//! are appended to the returned root in place, without a second store call.
//! Persistence is deferred. Every post created or looked up through a store
//! is part of its change set ([`ThreadStore::changed_threads`]), and
//! [`ThreadStore::flush`] writes that set back in one batch.
//!
//! # Example
//!
//! ```rust
//! use slack2mm::core::models::IntermediatePost;
//! use slack2mm::store::{MemoryStore, ThreadStore};
//!
//! # fn main() -> slack2mm::Result<()> {
//! let mut store = MemoryStore::new();
//! store.store_thread("1700000000.000100", IntermediatePost::new("alice", "general", "root", 1700000000000));
//!
//! let root = store.lookup_thread("1700000000.000100")?.expect("stored above");
//! root.borrow_mut().replies.push(IntermediatePost::new("bob", "general", "reply", 1700000000001));
//!
//! let again = store.lookup_thread("1700000000.000100")?.expect("still there");
//! assert_eq!(again.borrow().replies.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::RedisConfig;
use crate::core::models::IntermediatePost;
use crate::error::Result;

mod cached;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use cached::{CachedStore, CachedStoreFactory, MapBackend, RemoteBackend};
pub use memory::{MemoryStore, MemoryStoreFactory};
#[cfg(feature = "redis")]
pub use redis_store::{RedisBackend, RedisStoreFactory};

/// Shared, mutable handle to a root post owned by a store.
pub type SharedPost = Rc<RefCell<IntermediatePost>>;

/// Key-value store of thread roots for one channel.
pub trait ThreadStore {
    /// Returns `true` if a root is resolvable for `thread_id`.
    ///
    /// Does not add `thread_id` to the change set.
    fn has_thread(&mut self, thread_id: &str) -> Result<bool>;

    /// Returns the root stored under `thread_id`, if any.
    ///
    /// A found root joins the change set, since callers may mutate it.
    fn lookup_thread(&mut self, thread_id: &str) -> Result<Option<SharedPost>>;

    /// Inserts or replaces the root for `thread_id` and returns its handle.
    fn store_thread(&mut self, thread_id: &str, post: IntermediatePost) -> SharedPost;

    /// All roots created or looked up during this store's lifetime, in no
    /// particular order.
    fn changed_threads(&self) -> Vec<SharedPost>;

    /// Persists the change set to the backing store, if there is one.
    fn flush(&mut self) -> Result<()>;
}

/// Opens one [`ThreadStore`] per channel.
pub trait StoreFactory {
    /// Opens a store namespaced to `channel`.
    fn open(&mut self, channel: &str) -> Result<Box<dyn ThreadStore>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Selects the store implementation for a run.
///
/// With `None` every channel gets a [`MemoryStore`]. With a Redis
/// configuration the connection is established (and checked) here, so bad
/// parameters fail before any channel is processed.
pub fn open_factory(redis: Option<&RedisConfig>) -> Result<Box<dyn StoreFactory>> {
    match redis {
        None => Ok(Box::new(MemoryStoreFactory)),
        #[cfg(feature = "redis")]
        Some(config) => Ok(Box::new(RedisStoreFactory::connect(config)?)),
        #[cfg(not(feature = "redis"))]
        Some(config) => {
            config.validate()?;
            Err(crate::error::MigrateError::invalid_config(
                "redis endpoint given but slack2mm was built without the `redis` feature",
            ))
        }
    }
}

/// Takes the post out of a handle, cloning only if it is still shared.
pub fn into_post(shared: SharedPost) -> IntermediatePost {
    Rc::try_unwrap(shared)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone())
}
