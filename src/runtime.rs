//! Runtime abstraction layer for async operations
//!
//! Tile fetches and parcel lookups are spawned through [`AsyncSpawner`] so the
//! map and the view never name a concrete executor.

use futures::future::BoxFuture;
use std::sync::Arc;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Shared spawner handed to the map and the view
pub type SharedSpawner = Arc<dyn AsyncSpawner>;

#[cfg(feature = "tokio-runtime")]
pub mod tokio_impl {
    use super::*;
    use ::tokio::runtime::Handle;
    use ::tokio::task::JoinHandle;

    /// Tokio-based spawner. Holds a runtime handle so it can spawn from
    /// threads that are not inside the runtime (the UI thread).
    #[derive(Clone)]
    pub struct TokioSpawner {
        handle: Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Spawner for the runtime the caller is running in.
        /// Panics outside a tokio runtime, like `Handle::current`.
        pub fn current() -> Self {
            Self::new(Handle::current())
        }

        pub fn shared(self) -> SharedSpawner {
            Arc::new(self)
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
            Box::new(TokioHandle(self.handle.spawn(future)))
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }

        fn cancel(&self) {
            self.0.abort();
        }
    }
}
