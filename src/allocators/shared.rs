use parking_lot::{Mutex, MutexGuard};

use super::{Id, IdTable, IdTableConfig, Result};

/// An [`IdTable`] behind a single lock, for tables shared between threads
/// such as the per-peer table of in-flight request ids.
///
/// Payload references never escape the lock; use [`SharedIdTable::with`] to
/// read one, or [`SharedIdTable::lock`] for several operations in one
/// critical section.
#[derive(Debug)]
pub struct SharedIdTable<T> {
    inner: Mutex<IdTable<T>>,
}

impl<T> Default for SharedIdTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedIdTable<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IdTable::new()),
        }
    }

    pub fn with_config(config: IdTableConfig) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(IdTable::with_config(config)?),
        })
    }

    pub fn alloc(&self, value: T) -> Result<Id> {
        self.inner.lock().alloc(value).map(|(id, _)| id)
    }

    pub fn alloc_with<F>(&self, f: F) -> Result<Id>
    where
        F: FnOnce(Id) -> T,
    {
        self.inner.lock().alloc_with(f).map(|(id, _)| id)
    }

    pub fn alloc_at(&self, id: Id, value: T) -> Result<()> {
        self.inner.lock().alloc_at(id, value).map(|_| ())
    }

    /// Runs `f` on the payload of `id` while holding the lock.
    pub fn with<R, F>(&self, id: Id, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock().lookup_mut(id).map(f)
    }

    /// Looks up and frees `id` in one critical section.
    pub fn take(&self, id: Id) -> Option<T> {
        self.inner.lock().remove(id)
    }

    pub fn free(&self, id: Id) -> bool {
        self.inner.lock().free(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn lock(&self) -> MutexGuard<'_, IdTable<T>> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> IdTable<T> {
        self.inner.into_inner()
    }
}
