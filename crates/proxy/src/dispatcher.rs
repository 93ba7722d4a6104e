//! Per-call routing for generated proxies
//!
//! A [`Dispatcher`] stands in for the target. Each member is routed through
//! a route table computed once by the factory: pass-through members call the
//! target directly with no envelope, intercepted members pack their
//! arguments and hand them to the chain manager.
//!
//! Members are addressed by their declaration position in the contract, so
//! a call resolves its identity and route with two slice indexes. Contracts
//! implement themselves for `Dispatcher<dyn Contract>` by forwarding each
//! method to one of the `dispatch*` helpers:
//!
//! ```ignore
//! impl Greeter for Dispatcher<dyn Greeter> {
//!     fn greet(&self, name: String) -> String {
//!         // `greet` is the first member the contract declares
//!         self.dispatch(0, (name,), |t, (name,)| t.greet(name)).unwrap()
//!     }
//! }
//! ```

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use interpose_chain::InterceptorManager;
use interpose_core::{
    CallEnvelope, ContractDescriptor, IntoArguments, MethodIdentity, ProxyError, ProxyResult,
};

/// Where calls to one member go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Straight to the target
    PassThrough,
    /// Through the member's interceptor chain
    Chain,
}

/// Routes indexed by member declaration position
pub(crate) type RouteTable = Arc<[Route]>;

/// Stand-in for a target of type `T`
pub struct Dispatcher<T: ?Sized> {
    target: Arc<T>,
    manager: Arc<dyn InterceptorManager<T>>,
    contract: Arc<ContractDescriptor>,
    routes: RouteTable,
}

impl<T: ?Sized> Dispatcher<T> {
    pub(crate) fn new(
        target: Arc<T>,
        manager: Arc<dyn InterceptorManager<T>>,
        contract: Arc<ContractDescriptor>,
        routes: RouteTable,
    ) -> Self {
        Dispatcher {
            target,
            manager,
            contract,
            routes,
        }
    }

    /// The wrapped target
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Contract metadata
    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }

    /// Declaration position of the first member named `name`
    ///
    /// # Errors
    ///
    /// `Configuration` if the contract has no such member.
    pub fn position(&self, name: &str) -> ProxyResult<usize> {
        self.contract
            .members()
            .iter()
            .position(|member| member.name() == name)
            .ok_or_else(|| {
                ProxyError::configuration(format!(
                    "{} has no member named '{}'",
                    self.contract.name(),
                    name
                ))
            })
    }

    /// Route chosen for the member at `position` when the factory was built
    ///
    /// # Errors
    ///
    /// `Configuration` if the contract declares fewer members.
    pub fn route(&self, position: usize) -> ProxyResult<Route> {
        self.resolve(position).map(|(_, route)| route)
    }

    fn resolve(&self, position: usize) -> ProxyResult<(&MethodIdentity, Route)> {
        match (self.contract.members().get(position), self.routes.get(position)) {
            (Some(member), Some(route)) => Ok((member.identity(), *route)),
            _ => Err(ProxyError::configuration(format!(
                "{} has no member at position {}",
                self.contract.name(),
                position
            ))),
        }
    }

    fn envelope<A: IntoArguments>(&self, member: &MethodIdentity, args: A) -> CallEnvelope {
        CallEnvelope::pack(Arc::clone(&self.contract), member.clone(), args)
    }

    /// Dispatch a value-returning member
    ///
    /// `direct` calls the member on the target and is used only on the
    /// pass-through route.
    ///
    /// # Errors
    ///
    /// Anything the chain returns, including faults from the target, and
    /// `ReturnTypeMismatch` if the chain produced something other than an `R`.
    pub fn dispatch<A, R, F>(&self, position: usize, args: A, direct: F) -> ProxyResult<R>
    where
        A: IntoArguments,
        R: Any,
        F: FnOnce(&T, A) -> R,
    {
        match self.resolve(position)? {
            (member, Route::PassThrough) => {
                trace!(member = %member, "pass-through");
                Ok(direct(&*self.target, args))
            }
            (member, Route::Chain) => {
                trace!(member = %member, "intercepted");
                let envelope = self.envelope(member, args);
                self.manager
                    .invoke_chain(member, &envelope, &*self.target)?
                    .downcast::<R>(member.name())
            }
        }
    }

    /// Dispatch a member that returns nothing
    pub fn dispatch_void<A, F>(&self, position: usize, args: A, direct: F) -> ProxyResult<()>
    where
        A: IntoArguments,
        F: FnOnce(&T, A),
    {
        match self.resolve(position)? {
            (member, Route::PassThrough) => {
                trace!(member = %member, "pass-through");
                direct(&*self.target, args);
                Ok(())
            }
            (member, Route::Chain) => {
                trace!(member = %member, "intercepted");
                let envelope = self.envelope(member, args);
                self.manager
                    .invoke_chain_void(member, &envelope, &*self.target)
            }
        }
    }

    /// Dispatch a member returning `Result<V, E>`
    ///
    /// A fault carrying an `E` comes back as that same `E`; any other error
    /// is converted with `E::from`.
    pub fn dispatch_fallible<A, V, E, F>(&self, position: usize, args: A, direct: F) -> Result<V, E>
    where
        A: IntoArguments,
        V: Any,
        E: From<ProxyError> + StdError + Send + Sync + 'static,
        F: FnOnce(&T, A) -> Result<V, E>,
    {
        match self.resolve(position)? {
            (member, Route::PassThrough) => {
                trace!(member = %member, "pass-through");
                direct(&*self.target, args)
            }
            (member, Route::Chain) => {
                trace!(member = %member, "intercepted");
                let envelope = self.envelope(member, args);
                match self.manager.invoke_chain(member, &envelope, &*self.target) {
                    Ok(outcome) => Ok(outcome.downcast::<V>(member.name())?),
                    Err(ProxyError::Fault(fault)) => match fault.downcast::<E>() {
                        Ok(original) => Err(original),
                        Err(fault) => Err(E::from(ProxyError::Fault(fault))),
                    },
                    Err(e) => Err(E::from(e)),
                }
            }
        }
    }
}

impl<T: ?Sized> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Dispatcher {
            target: Arc::clone(&self.target),
            manager: Arc::clone(&self.manager),
            contract: Arc::clone(&self.contract),
            routes: Arc::clone(&self.routes),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let intercepted = self
            .routes
            .iter()
            .filter(|route| **route == Route::Chain)
            .count();
        f.debug_struct("Dispatcher")
            .field("contract", &self.contract.name())
            .field("members", &self.routes.len())
            .field("intercepted", &intercepted)
            .finish()
    }
}
