//! # Shared Resources
//!
//! Some infrastructure is shared by several components of one environment,
//! such as a container network every service joins. Instead of a global
//! cache, the assembler creates a [`SharedResource`] and passes clones of it
//! into each component's constructor. The first component to need the
//! resource initializes it; the rest reuse the same value.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

/// Lazily initialized value shared between components.
pub struct SharedResource<T> {
    cell: Arc<OnceCell<T>>,
}

impl<T> SharedResource<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A resource that is already initialized.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            cell: Arc::new(OnceCell::new_with(Some(value))),
        }
    }

    /// The value, if some holder initialized it.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the value, running `init` if nobody has yet.
    ///
    /// Concurrent callers wait for the one running `init`. If it fails the
    /// error is returned to that caller and the next caller tries again.
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_try_init(init).await
    }
}

impl<T> Clone for SharedResource<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Default for SharedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SharedResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResource")
            .field("value", &self.cell.get())
            .finish()
    }
}
