use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use super::disposed;
use crate::error::*;

/// Builds key material on demand.
pub type KeyFactory<K> = Arc<dyn Fn() -> Result<K, Error> + Send + Sync>;

/// Where an asymmetric algorithm gets its keys from.
///
/// The public key factory is mandatory. Without a private key factory the
/// algorithm can only verify.
pub struct KeyFactories<KP, PK> {
    pub(crate) public: KeyFactory<PK>,
    pub(crate) private: Option<KeyFactory<KP>>,
}

impl<KP, PK> Clone for KeyFactories<KP, PK> {
    fn clone(&self) -> Self {
        KeyFactories {
            public: self.public.clone(),
            private: self.private.clone(),
        }
    }
}

impl<KP, PK> fmt::Debug for KeyFactories<KP, PK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFactories")
            .field("private", &self.private.is_some())
            .finish()
    }
}

impl<KP, PK> KeyFactories<KP, PK> {
    pub fn new<F>(public: F) -> Self
    where
        F: Fn() -> Result<PK, Error> + Send + Sync + 'static,
    {
        KeyFactories {
            public: Arc::new(public),
            private: None,
        }
    }

    pub fn with_private<F>(mut self, private: F) -> Self
    where
        F: Fn() -> Result<KP, Error> + Send + Sync + 'static,
    {
        self.private = Some(Arc::new(private));
        self
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }
}

/// Native key providers, built lazily and at most once per thread.
///
/// Each thread works with its own provider, so providers are never used
/// concurrently. `dispose()` drops all of them at once; it is idempotent and
/// also runs on drop.
///
/// Entries are keyed by `ThreadId` and are not evicted when their thread
/// exits, so the cache holds one provider per thread that ever used the
/// algorithm until it is disposed. Use long-lived worker threads.
pub struct ProviderCache<P> {
    alg_name: &'static str,
    providers: DashMap<ThreadId, Arc<P>>,
    disposed: AtomicBool,
}

impl<P> fmt::Debug for ProviderCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCache")
            .field("alg", &self.alg_name)
            .field("providers", &self.providers.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<P> ProviderCache<P> {
    pub fn new(alg_name: &'static str) -> Self {
        ProviderCache {
            alg_name,
            providers: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the provider of the current thread, creating it with `init`
    /// if this thread has none yet.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<P>, Error>
    where
        F: FnOnce() -> Result<P, Error>,
    {
        if self.is_disposed() {
            return Err(disposed(self.alg_name));
        }
        let thread_id = thread::current().id();
        if let Some(provider) = self.providers.get(&thread_id) {
            return Ok(provider.value().clone());
        }
        let provider = Arc::new(init()?);
        self.providers.insert(thread_id, provider.clone());
        tracing::debug!(alg = self.alg_name, ?thread_id, "created key provider");
        // a concurrent dispose() may have missed the insertion above
        if self.is_disposed() {
            self.providers.remove(&thread_id);
            return Err(disposed(self.alg_name));
        }
        Ok(provider)
    }

    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = self.providers.len();
        self.providers.clear();
        tracing::debug!(alg = self.alg_name, count, "disposed key providers");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of threads currently holding a provider.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<P> Drop for ProviderCache<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
