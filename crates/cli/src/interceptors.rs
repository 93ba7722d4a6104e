//! Caching and logging interceptors for [`SlowService`].
//!
//! The cache store is injected: every `caching` interceptor the catalog
//! builds shares one [`ResultCache`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use interpose_chain::{Interceptor, Next};
use interpose_core::{CallEnvelope, Outcome, ProxyResult};
use interpose_proxy::MarkerCatalog;

use crate::service::SlowService;

struct CacheEntry {
    value: u64,
    stored: Instant,
}

/// Results keyed by member and arguments, expiring after a fixed lifetime.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        ResultCache {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cache key for a call: member name, then each argument's debug form
    pub fn key(envelope: &CallEnvelope) -> String {
        let args: Vec<String> = envelope
            .arguments()
            .iter()
            .map(|arg| format!("{:?}", arg))
            .collect();
        format!("{}_{}", envelope.method(), args.join(","))
    }

    /// Live entry for `key`; an expired entry is dropped
    pub fn get(&self, key: &str) -> Option<u64> {
        if let Some(entry) = self.entries.get(key) {
            if entry.stored.elapsed() < self.ttl {
                return Some(entry.value);
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.stored.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: String, value: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Answers from the cache, otherwise calls through and stores the result.
pub struct CachingInterceptor {
    cache: Arc<ResultCache>,
}

impl CachingInterceptor {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        CachingInterceptor { cache }
    }
}

impl Interceptor<dyn SlowService> for CachingInterceptor {
    fn name(&self) -> &str {
        "caching"
    }

    fn intercept(
        &self,
        next: Next<'_, dyn SlowService>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn SlowService + 'static),
    ) -> ProxyResult<Outcome> {
        let key = ResultCache::key(envelope);
        if let Some(hit) = self.cache.get(&key) {
            debug!(method, key = %key, "cache hit");
            return Ok(Outcome::new(hit));
        }

        let value = next
            .proceed(method, envelope, target)?
            .downcast::<u64>(method)?;
        self.cache.insert(key, value);
        Ok(Outcome::new(value))
    }
}

/// Reports every call that reaches it.
pub struct LoggingInterceptor;

impl Interceptor<dyn SlowService> for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    fn intercept(
        &self,
        next: Next<'_, dyn SlowService>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn SlowService + 'static),
    ) -> ProxyResult<Outcome> {
        info!(method, "not found in the cache, calling directly");
        next.proceed(method, envelope, target)
    }
}

/// Catalog binding `caching` and `logging`
pub fn catalog(cache: &Arc<ResultCache>) -> MarkerCatalog<dyn SlowService> {
    let cache = Arc::clone(cache);
    MarkerCatalog::new()
        .register("caching", move || {
            Arc::new(CachingInterceptor::new(Arc::clone(&cache))) as Arc<dyn Interceptor<dyn SlowService>>
        })
        .register("logging", || {
            Arc::new(LoggingInterceptor) as Arc<dyn Interceptor<dyn SlowService>>
        })
}
