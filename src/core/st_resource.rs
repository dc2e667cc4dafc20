use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded, reference-counted value with interior mutability.
///
/// Used where the sync core and a test harness need to observe the same
/// state without crossing threads, e.g. the loopback channel's sent-message
/// log: the core owns a boxed channel, the test keeps a clone of the log.
///
/// # Examples
///
/// ```
/// use voxel_sync::core::StResource;
///
/// let sent = StResource::new(Vec::<String>::new());
/// let core_view = sent.clone();
///
/// core_view.get_mut().push("{\"method\":\"addPlayer\"}".to_string());
/// assert_eq!(sent.get().len(), 1);
/// ```
///
/// # Panics
/// Panics if a mutable borrow is requested while any other borrow is alive.
/// Not `Send`: keep it on the event-loop thread.
pub struct StResource<T> {
    /// The shared value.
    pub resource: Rc<RefCell<T>>,
}

impl<T> StResource<T> {
    /// Creates a new `StResource` holding `resource`.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Rc::new(RefCell::new(resource)),
        }
    }

    /// Borrows the contained value.
    pub fn get(&self) -> Ref<'_, T> {
        self.resource.borrow()
    }

    /// Mutably borrows the contained value.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.resource.borrow_mut()
    }

    /// Swaps the contained value out, leaving `T::default()` behind.
    pub fn take(&self) -> T
    where
        T: Default,
    {
        self.resource.take()
    }
}

impl<T> Clone for StResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Default> Default for StResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
