//! Declarative interceptor discovery
//!
//! Members carry marker names (see `ContractBuilder::marker`). A
//! [`MarkerCatalog`] maps each marker to a factory; [`MarkerSource`] resolves
//! every member's markers against the catalog when it is built, so unknown
//! markers fail early instead of at the first call.
//!
//! Each lookup instantiates fresh interceptors. State that must be shared
//! between instances (a cache, a counter) belongs to whatever the factory
//! closure captures.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use interpose_chain::Interceptor;
use interpose_core::{ContractDescriptor, MemberDescriptor, MethodIdentity, ProxyError, ProxyResult};

use crate::config::InterceptorConfig;
use crate::source::InterceptorSource;

type MarkerFactory<T> = Arc<dyn Fn() -> Arc<dyn Interceptor<T>> + Send + Sync>;

/// Marker name to interceptor factory
pub struct MarkerCatalog<T: ?Sized> {
    factories: FxHashMap<String, MarkerFactory<T>>,
}

impl<T: ?Sized> MarkerCatalog<T> {
    /// Empty catalog
    pub fn new() -> Self {
        MarkerCatalog {
            factories: FxHashMap::default(),
        }
    }

    /// Bind `marker` to `factory`, replacing any earlier binding
    pub fn register<F>(mut self, marker: &str, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Interceptor<T>> + Send + Sync + 'static,
    {
        self.factories.insert(marker.to_string(), Arc::new(factory));
        self
    }

    /// Returns true if `marker` is bound
    pub fn contains(&self, marker: &str) -> bool {
        self.factories.contains_key(marker)
    }

    /// Bound marker names, sorted
    pub fn markers(&self) -> Vec<&str> {
        let mut markers: Vec<&str> = self.factories.keys().map(|m| m.as_str()).collect();
        markers.sort_unstable();
        markers
    }

    /// Fresh interceptor for `marker`
    pub fn instantiate(&self, marker: &str) -> Option<Arc<dyn Interceptor<T>>> {
        self.factories.get(marker).map(|factory| factory())
    }
}

impl<T: ?Sized> Default for MarkerCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for MarkerCatalog<T> {
    fn clone(&self) -> Self {
        MarkerCatalog {
            factories: self.factories.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for MarkerCatalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerCatalog")
            .field("markers", &self.markers())
            .finish()
    }
}

/// Interceptor source driven by member markers
pub struct MarkerSource<T: ?Sized> {
    catalog: MarkerCatalog<T>,
    bindings: FxHashMap<MethodIdentity, Vec<String>>,
    order: Vec<String>,
}

impl<T: ?Sized> MarkerSource<T> {
    /// Resolve the markers declared on `contract`
    ///
    /// # Errors
    ///
    /// `Configuration` if the contract's target is not a trait object or a
    /// marker is missing from the catalog.
    pub fn new(contract: &ContractDescriptor, catalog: MarkerCatalog<T>) -> ProxyResult<Self> {
        Self::resolve(contract, catalog, |member| member.markers())
    }

    /// Resolve markers from `config`, falling back to the declared ones
    ///
    /// # Errors
    ///
    /// `Configuration` if the config names another contract or an unknown
    /// member, plus everything [`MarkerSource::new`] rejects.
    pub fn from_config(
        contract: &ContractDescriptor,
        catalog: MarkerCatalog<T>,
        config: &InterceptorConfig,
    ) -> ProxyResult<Self> {
        config.check_contract(contract.name())?;
        if let Some(unknown) = config
            .members
            .keys()
            .find(|name| contract.member_named(name).is_none())
        {
            return Err(ProxyError::configuration(format!(
                "interceptor config binds '{}', which is not a member of {}",
                unknown,
                contract.name()
            )));
        }

        Self::resolve(contract, catalog, |member| {
            config
                .markers_for(member.name())
                .unwrap_or_else(|| member.markers())
        })
    }

    fn resolve<'c, F>(
        contract: &'c ContractDescriptor,
        catalog: MarkerCatalog<T>,
        markers_of: F,
    ) -> ProxyResult<Self>
    where
        F: Fn(&'c MemberDescriptor) -> &'c [String],
    {
        if !contract.is_interface() {
            return Err(ProxyError::configuration(format!(
                "expected a trait object contract but got {}",
                contract.type_name()
            )));
        }

        let mut bindings = FxHashMap::default();
        let mut order: Vec<String> = Vec::new();
        for member in contract.members() {
            let mut distinct: Vec<String> = Vec::new();
            for marker in markers_of(member) {
                if !catalog.contains(marker) {
                    return Err(ProxyError::configuration(format!(
                        "unknown interceptor marker '{}' on {}",
                        marker,
                        member.name()
                    )));
                }
                if !distinct.contains(marker) {
                    distinct.push(marker.clone());
                }
                if !order.contains(marker) {
                    order.push(marker.clone());
                }
            }
            if !distinct.is_empty() {
                bindings.insert(member.identity().clone(), distinct);
            }
        }

        Ok(MarkerSource {
            catalog,
            bindings,
            order,
        })
    }

    /// Distinct markers over all members, in order of first appearance
    pub fn markers(&self) -> &[String] {
        &self.order
    }

    /// Markers bound to `identity`
    pub fn markers_of(&self, identity: &MethodIdentity) -> &[String] {
        self.bindings
            .get(identity)
            .map(|markers| markers.as_slice())
            .unwrap_or(&[])
    }

    fn instantiate_all(&self, markers: &[String]) -> Vec<Arc<dyn Interceptor<T>>> {
        markers
            .iter()
            .filter_map(|marker| self.catalog.instantiate(marker))
            .collect()
    }
}

impl<T: ?Sized> InterceptorSource<T> for MarkerSource<T> {
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor<T>>> {
        self.instantiate_all(&self.order)
    }

    fn find_matching_interceptors(
        &self,
        _contract: &ContractDescriptor,
        member: &MemberDescriptor,
    ) -> Vec<Arc<dyn Interceptor<T>>> {
        self.instantiate_all(self.markers_of(member.identity()))
    }
}

impl<T: ?Sized> fmt::Debug for MarkerSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerSource")
            .field("markers", &self.order)
            .field("bound_members", &self.bindings.len())
            .finish()
    }
}
