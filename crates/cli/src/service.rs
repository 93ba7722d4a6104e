//! The slow service the demo proxies.
//!
//! `sleep_1s` and `sleep_2s` are marked `caching` then `logging`, so a cache
//! hit never reaches the logger. `get_calls` carries no markers and always
//! passes straight through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;

use interpose_chain::Contract;
use interpose_core::ProxyError;
use interpose_proxy::{Dispatcher, Proxyable};

/// Errors surfaced by the proxied service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

pub trait SlowService: Send + Sync {
    /// Sleep one delay unit, return the new call count
    fn sleep_1s(&self) -> Result<u64, ServiceError>;
    /// Sleep two delay units, return the new call count
    fn sleep_2s(&self) -> Result<u64, ServiceError>;
    /// Number of slow calls that reached the service
    fn get_calls(&self) -> Result<u64, ServiceError>;
}

/// Sleeps for real and counts the calls it served.
pub struct SleepyService {
    delay: Duration,
    calls: AtomicU64,
}

impl SleepyService {
    pub fn new(delay: Duration) -> Self {
        SleepyService {
            delay,
            calls: AtomicU64::new(0),
        }
    }

    fn sleep_units(&self, units: u32) -> u64 {
        thread::sleep(self.delay * units);
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl SlowService for SleepyService {
    fn sleep_1s(&self) -> Result<u64, ServiceError> {
        Ok(self.sleep_units(1))
    }

    fn sleep_2s(&self) -> Result<u64, ServiceError> {
        Ok(self.sleep_units(2))
    }

    fn get_calls(&self) -> Result<u64, ServiceError> {
        Ok(self.calls.load(Ordering::SeqCst))
    }
}

static CONTRACT: Lazy<Result<Arc<Contract<dyn SlowService>>, ProxyError>> = Lazy::new(|| {
    Contract::<dyn SlowService>::builder("SlowService")
        .method_fallible("sleep_1s", &[], |t, (): ()| t.sleep_1s())
        .marker("caching")
        .marker("logging")
        .method_fallible("sleep_2s", &[], |t, (): ()| t.sleep_2s())
        .marker("caching")
        .marker("logging")
        .method_fallible("get_calls", &[], |t, (): ()| t.get_calls())
        .build()
        .map(Arc::new)
});

impl Proxyable for dyn SlowService {
    fn contract() -> Result<Arc<Contract<Self>>, ProxyError> {
        match &*CONTRACT {
            Ok(contract) => Ok(Arc::clone(contract)),
            Err(e) => Err(ProxyError::configuration(e.to_string())),
        }
    }

    fn from_dispatcher(dispatcher: Dispatcher<Self>) -> Arc<Self> {
        Arc::new(dispatcher)
    }
}

impl SlowService for Dispatcher<dyn SlowService> {
    fn sleep_1s(&self) -> Result<u64, ServiceError> {
        self.dispatch_fallible(0, (), |t, ()| t.sleep_1s())
    }

    fn sleep_2s(&self) -> Result<u64, ServiceError> {
        self.dispatch_fallible(1, (), |t, ()| t.sleep_2s())
    }

    fn get_calls(&self) -> Result<u64, ServiceError> {
        self.dispatch_fallible(2, (), |t, ()| t.get_calls())
    }
}
