//! Chain storage and invocation
//!
//! [`InterceptorManager`] is the seam a dispatcher talks to: register one
//! chain per member, ask whether a member has one, run it. [`ChainRegistry`]
//! is the default in-memory implementation.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use interpose_core::{CallEnvelope, MethodIdentity, Outcome, ProxyError, ProxyResult};

use crate::contract::Member;
use crate::interceptor::{Interceptor, Next};
use crate::terminal::TerminalInvoker;

/// Owns the chains for one contract
///
/// Registration happens while a factory is being built; afterwards the
/// manager is shared read-only and must tolerate concurrent invocations.
pub trait InterceptorManager<T: ?Sized>: Send + Sync {
    /// Build and store the chain for `member`
    ///
    /// The chain runs `interceptors` in order, then a terminal invoking the
    /// member.
    ///
    /// # Errors
    ///
    /// `DuplicateChain` if the member already has a chain.
    fn register_chain(
        &mut self,
        member: &Member<T>,
        interceptors: Vec<Arc<dyn Interceptor<T>>>,
    ) -> ProxyResult<()>;

    /// Returns true if `identity` has a registered chain
    fn has_chain(&self, identity: &MethodIdentity) -> bool;

    /// Run the chain for a value-returning member
    ///
    /// # Errors
    ///
    /// `UnregisteredChain` if `identity` has no chain, otherwise whatever the
    /// chain returns.
    fn invoke_chain(
        &self,
        identity: &MethodIdentity,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<Outcome>;

    /// Run the chain for a member that returns nothing
    fn invoke_chain_void(
        &self,
        identity: &MethodIdentity,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<()>;
}

/// Interceptors for one member followed by its terminal
pub struct InterceptorChain<T: ?Sized> {
    method: Arc<str>,
    links: Vec<Arc<dyn Interceptor<T>>>,
}

impl<T: ?Sized + 'static> InterceptorChain<T> {
    /// Chain running `interceptors` and then `member`
    pub fn new(member: &Member<T>, mut interceptors: Vec<Arc<dyn Interceptor<T>>>) -> Self {
        interceptors.push(Arc::new(TerminalInvoker::new(member.clone())));
        InterceptorChain {
            method: member.identity().shared_name(),
            links: interceptors,
        }
    }
}

impl<T: ?Sized> InterceptorChain<T> {
    /// Name of the member this chain ends in
    pub fn method(&self) -> &str {
        &self.method
    }

    /// All links, terminal last
    pub fn links(&self) -> &[Arc<dyn Interceptor<T>>] {
        &self.links
    }

    /// Number of interceptors, terminal excluded
    pub fn interceptor_count(&self) -> usize {
        self.links.len() - 1
    }

    /// Fresh cursor at the first link
    pub fn first(&self) -> Next<'_, T> {
        Next::new(&self.links, 0)
    }

    /// Run the chain for a value-returning call
    pub fn invoke(&self, envelope: &CallEnvelope, target: &T) -> ProxyResult<Outcome> {
        self.first().proceed(&self.method, envelope, target)
    }

    /// Run the chain for a call that returns nothing
    pub fn invoke_void(&self, envelope: &CallEnvelope, target: &T) -> ProxyResult<()> {
        self.first().proceed_void(&self.method, envelope, target)
    }
}

impl<T: ?Sized> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.links.iter().map(|link| link.name()).collect();
        f.debug_struct("InterceptorChain")
            .field("method", &self.method)
            .field("links", &names)
            .finish()
    }
}

/// In-memory chain storage keyed by member identity
pub struct ChainRegistry<T: ?Sized> {
    chains: FxHashMap<MethodIdentity, InterceptorChain<T>>,
}

impl<T: ?Sized> ChainRegistry<T> {
    /// Empty registry
    pub fn new() -> Self {
        ChainRegistry {
            chains: FxHashMap::default(),
        }
    }

    /// The chain registered for `identity`
    pub fn chain(&self, identity: &MethodIdentity) -> Option<&InterceptorChain<T>> {
        self.chains.get(identity)
    }

    /// Number of registered chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns true if no chain is registered
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    fn lookup(&self, identity: &MethodIdentity) -> ProxyResult<&InterceptorChain<T>> {
        self.chains
            .get(identity)
            .ok_or_else(|| ProxyError::UnregisteredChain {
                identity: identity.clone(),
            })
    }
}

impl<T: ?Sized> Default for ChainRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> InterceptorManager<T> for ChainRegistry<T> {
    fn register_chain(
        &mut self,
        member: &Member<T>,
        interceptors: Vec<Arc<dyn Interceptor<T>>>,
    ) -> ProxyResult<()> {
        let identity = member.identity();
        if self.chains.contains_key(identity) {
            return Err(ProxyError::DuplicateChain {
                identity: identity.clone(),
            });
        }

        let chain = InterceptorChain::new(member, interceptors);
        debug!(
            member = %identity,
            interceptors = chain.interceptor_count(),
            "registered interceptor chain"
        );
        self.chains.insert(identity.clone(), chain);
        Ok(())
    }

    fn has_chain(&self, identity: &MethodIdentity) -> bool {
        self.chains.contains_key(identity)
    }

    fn invoke_chain(
        &self,
        identity: &MethodIdentity,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<Outcome> {
        self.lookup(identity)?.invoke(envelope, target)
    }

    fn invoke_chain_void(
        &self,
        identity: &MethodIdentity,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<()> {
        self.lookup(identity)?.invoke_void(envelope, target)
    }
}

impl<T: ?Sized> fmt::Debug for ChainRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("chains", &self.chains.len())
            .finish()
    }
}
