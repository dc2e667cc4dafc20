use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted value shared between the event loop and
/// a transport worker thread.
///
/// The WebSocket channel keeps its connection state in an `MtResource` so the
/// I/O worker can flip it to `Open`/`Closed` while the sync core, on the loop
/// thread, checks it before every send.
///
/// # Examples
///
/// ```
/// use std::thread;
/// use voxel_sync::core::MtResource;
///
/// let opened = MtResource::new(false);
/// let worker_view = opened.clone();
///
/// thread::spawn(move || worker_view.set(true)).join().unwrap();
/// assert!(*opened.get());
/// ```
///
/// # Poisoning
/// A panic on the worker thread while holding the lock does not propagate:
/// the guard is recovered and the last written value is used.
pub struct MtResource<T: Send + Sync> {
    /// The shared value.
    pub resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` holding `resource`.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard for the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a write guard for the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the contained value.
    pub fn set(&self, value: T) {
        *self.get_mut() = value;
    }
}

impl<T: Send + Sync + Copy + 'static> MtResource<T> {
    /// Copies the contained value out of the lock.
    pub fn load(&self) -> T {
        *self.get()
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
