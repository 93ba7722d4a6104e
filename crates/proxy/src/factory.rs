//! Proxy factories
//!
//! A [`ProxyFactory`] is built once per contract. Construction asks the
//! interceptor source about every member, registers a chain for each member
//! that matched, and freezes the route table. After that,
//! [`ProxyFactory::generate_proxy`] is cheap and can be called for any number
//! of targets.
//!
//! If no member ends up with a chain, `generate_proxy` hands the target back
//! unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use interpose_chain::{ChainRegistry, Contract, Interceptor, InterceptorManager};
use interpose_core::{ProxyError, ProxyResult};

use crate::config::InterceptorConfig;
use crate::dispatcher::{Dispatcher, Route, RouteTable};
use crate::marker::{MarkerCatalog, MarkerSource};
use crate::source::InterceptorSource;

/// A contract that proxies can be generated for
///
/// Implemented for the contract's trait object, usually next to a hand
/// written `impl Contract for Dispatcher<dyn Contract>`.
pub trait Proxyable: Send + Sync + 'static {
    /// The contract shared by every factory of this type
    ///
    /// # Errors
    ///
    /// Whatever kept the contract from building; factory construction
    /// stops with it.
    fn contract() -> ProxyResult<Arc<Contract<Self>>>;

    /// Wrap a dispatcher as the contract's trait object
    fn from_dispatcher(dispatcher: Dispatcher<Self>) -> Arc<Self>;
}

/// Builds proxies for one contract
pub struct ProxyFactory<T: Proxyable + ?Sized> {
    contract: Arc<Contract<T>>,
    manager: Arc<dyn InterceptorManager<T>>,
    routes: RouteTable,
    interceptors: Vec<Arc<dyn Interceptor<T>>>,
    discovered: usize,
}

impl<T: Proxyable + ?Sized> ProxyFactory<T> {
    /// Factory with a fresh [`ChainRegistry`]
    ///
    /// # Errors
    ///
    /// Whatever registering the discovered chains returns.
    pub fn new<S>(source: &S) -> ProxyResult<Self>
    where
        S: InterceptorSource<T> + ?Sized,
    {
        Self::with_manager(source, ChainRegistry::new())
    }

    /// Factory registering chains with `manager`
    ///
    /// Chains already present in `manager` also count when routes are
    /// decided. The factory takes `manager` over; hand it to further
    /// factories through [`ProxyFactory::manager`] and
    /// [`ProxyFactory::with_shared_manager`].
    ///
    /// # Errors
    ///
    /// `DuplicateChain` if `manager` already holds a chain for a member the
    /// source matched, or whatever [`Proxyable::contract`] returns.
    pub fn with_manager<S, M>(source: &S, manager: M) -> ProxyResult<Self>
    where
        S: InterceptorSource<T> + ?Sized,
        M: InterceptorManager<T> + 'static,
    {
        Self::with_shared_manager(source, Arc::new(manager))
    }

    /// Factory over a manager that may already back other factories
    ///
    /// Routes follow `manager.has_chain`, so chains registered by an earlier
    /// factory are picked up. New chains can only be registered while this
    /// is the sole handle to `manager`.
    ///
    /// # Errors
    ///
    /// `Configuration` if the source matched a member and `manager` is
    /// shared, `DuplicateChain` if it already holds that member's chain.
    pub fn with_shared_manager<S>(
        source: &S,
        mut manager: Arc<dyn InterceptorManager<T>>,
    ) -> ProxyResult<Self>
    where
        S: InterceptorSource<T> + ?Sized,
    {
        let contract = T::contract()?;
        let interceptors = source.interceptors();

        let mut discovered = 0;
        for member in contract.members() {
            let matching =
                source.find_matching_interceptors(contract.descriptor(), member.descriptor());
            if matching.is_empty() {
                continue;
            }
            let registry = Arc::get_mut(&mut manager).ok_or_else(|| {
                ProxyError::configuration(format!(
                    "cannot register {} with a manager shared by another factory",
                    member.identity()
                ))
            })?;
            registry.register_chain(member, matching)?;
            discovered += 1;
        }

        let routes: RouteTable = contract
            .members()
            .iter()
            .map(|member| {
                if manager.has_chain(member.identity()) {
                    Route::Chain
                } else {
                    Route::PassThrough
                }
            })
            .collect();
        let intercepted = routes.iter().filter(|r| **r == Route::Chain).count();

        debug!(
            contract = contract.name(),
            members = contract.len(),
            discovered,
            intercepted,
            "built proxy factory"
        );

        Ok(ProxyFactory {
            contract,
            manager,
            routes,
            interceptors,
            discovered,
        })
    }

    /// Factory driven by the markers declared on the contract
    ///
    /// # Errors
    ///
    /// `Configuration` if the contract is not a trait object or a marker is
    /// missing from `catalog`.
    pub fn declarative(catalog: MarkerCatalog<T>) -> ProxyResult<Self> {
        let source = MarkerSource::new(T::contract()?.descriptor(), catalog)?;
        Self::new(&source)
    }

    /// Factory driven by markers from `config`, falling back to the declared ones
    pub fn configured(catalog: MarkerCatalog<T>, config: &InterceptorConfig) -> ProxyResult<Self> {
        let source = MarkerSource::from_config(T::contract()?.descriptor(), catalog, config)?;
        Self::new(&source)
    }

    /// Proxy for `target`
    ///
    /// Returns `target` itself when no member is intercepted.
    pub fn generate_proxy(&self, target: Arc<T>) -> Arc<T> {
        if self.is_passthrough() {
            return target;
        }
        T::from_dispatcher(Dispatcher::new(
            target,
            Arc::clone(&self.manager),
            Arc::clone(self.contract.descriptor()),
            Arc::clone(&self.routes),
        ))
    }

    /// Distinct interceptors the source reported
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor<T>>] {
        &self.interceptors
    }

    /// Number of members the source matched interceptors for
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    /// Returns true if every member routes straight to the target
    pub fn is_passthrough(&self) -> bool {
        self.routes.iter().all(|route| *route == Route::PassThrough)
    }

    /// The chain manager proxies from this factory dispatch through
    pub fn manager(&self) -> &Arc<dyn InterceptorManager<T>> {
        &self.manager
    }

    /// The contract this factory proxies
    pub fn contract(&self) -> &Arc<Contract<T>> {
        &self.contract
    }
}

impl<T: Proxyable + ?Sized> fmt::Debug for ProxyFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("contract", &self.contract.name())
            .field("discovered", &self.discovered)
            .field("passthrough", &self.is_passthrough())
            .finish()
    }
}
