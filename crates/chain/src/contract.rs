//! Typed contracts: metadata plus one terminal binding per member
//!
//! A [`Contract<T>`] pairs a [`ContractDescriptor`] with the code that calls
//! each member on a `T` (usually a trait object such as `dyn Service`). The
//! binding is what the terminal invoker runs at the end of a chain; it pulls
//! the arguments out of the envelope, calls the real member, and wraps the
//! result.
//!
//! ```ignore
//! let contract = Contract::<dyn Greeter>::builder("Greeter")
//!     .method("greet", &["name"], |t, (name,): (String,)| t.greet(name))
//!     .marker("logging")
//!     .method_void("reset", &[], |t, (): ()| t.reset())
//!     .build()?;
//! ```

use std::any::{type_name, Any};
use std::error::Error as StdError;
use std::fmt;
use std::mem;
use std::sync::Arc;

use interpose_core::{
    CallEnvelope, ContractDescriptor, FromArguments, MemberDescriptor, MethodIdentity, Outcome,
    ParamDescriptor, ProxyError, ProxyResult, ReturnKind,
};

type Binding<T> = Arc<dyn Fn(&T, &CallEnvelope) -> ProxyResult<Outcome> + Send + Sync>;

/// Pointers to unsized types carry metadata and are wider than thin pointers
fn is_unsized<T: ?Sized>() -> bool {
    mem::size_of::<*const T>() != mem::size_of::<*const ()>()
}

/// One member of a typed contract
pub struct Member<T: ?Sized> {
    descriptor: MemberDescriptor,
    binding: Binding<T>,
}

impl<T: ?Sized> Member<T> {
    /// Member metadata
    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    /// Member identity
    pub fn identity(&self) -> &MethodIdentity {
        self.descriptor.identity()
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Call the real member on `target` with the envelope's arguments
    pub fn invoke(&self, target: &T, envelope: &CallEnvelope) -> ProxyResult<Outcome> {
        (self.binding)(target, envelope)
    }
}

impl<T: ?Sized> Clone for Member<T> {
    fn clone(&self) -> Self {
        Member {
            descriptor: self.descriptor.clone(),
            binding: Arc::clone(&self.binding),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A contract over targets of type `T`
pub struct Contract<T: ?Sized> {
    descriptor: Arc<ContractDescriptor>,
    members: Vec<Member<T>>,
}

impl<T: ?Sized + 'static> Contract<T> {
    /// Start declaring a contract
    pub fn builder(name: impl Into<String>) -> ContractBuilder<T> {
        ContractBuilder {
            name: name.into(),
            interface: is_unsized::<T>(),
            members: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T: ?Sized> Contract<T> {
    /// Shared contract metadata
    pub fn descriptor(&self) -> &Arc<ContractDescriptor> {
        &self.descriptor
    }

    /// Contract name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// All members, in declaration order
    pub fn members(&self) -> &[Member<T>] {
        &self.members
    }

    /// Look up a member by identity
    pub fn member(&self, identity: &MethodIdentity) -> Option<&Member<T>> {
        self.descriptor
            .position(identity)
            .map(|position| &self.members[position])
    }

    /// First member with the given name
    pub fn member_named(&self, name: &str) -> Option<&Member<T>> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Identity of the first member with the given name
    pub fn identity(&self, name: &str) -> Option<&MethodIdentity> {
        self.member_named(name).map(|m| m.identity())
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the contract declares no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for Contract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Contract`]
///
/// Declaration mistakes are collected and reported together by
/// [`ContractBuilder::build`].
pub struct ContractBuilder<T: ?Sized> {
    name: String,
    interface: bool,
    members: Vec<(MemberDescriptor, Binding<T>)>,
    errors: Vec<String>,
}

impl<T: ?Sized + 'static> ContractBuilder<T> {
    /// Declare a value-returning member
    pub fn method<A, R, F>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: FromArguments + 'static,
        R: Any + Send,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
    {
        let binding: Binding<T> = Arc::new(
            move |target: &T, envelope: &CallEnvelope| -> ProxyResult<Outcome> {
                let args = envelope.extract::<A>()?;
                Ok(Outcome::new(f(target, args)))
            },
        );
        self.declare::<A>(name, params, ReturnKind::Value, type_name::<R>(), binding)
    }

    /// Declare a member returning a future-like handle
    ///
    /// The handle is forwarded as an ordinary value and never awaited by the
    /// chain.
    pub fn method_future<A, R, F>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: FromArguments + 'static,
        R: Any + Send,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
    {
        let binding: Binding<T> = Arc::new(
            move |target: &T, envelope: &CallEnvelope| -> ProxyResult<Outcome> {
                let args = envelope.extract::<A>()?;
                Ok(Outcome::new(f(target, args)))
            },
        );
        self.declare::<A>(name, params, ReturnKind::Future, type_name::<R>(), binding)
    }

    /// Declare a member that returns nothing
    pub fn method_void<A, F>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: FromArguments + 'static,
        F: Fn(&T, A) + Send + Sync + 'static,
    {
        let binding: Binding<T> = Arc::new(
            move |target: &T, envelope: &CallEnvelope| -> ProxyResult<Outcome> {
                let args = envelope.extract::<A>()?;
                f(target, args);
                Ok(Outcome::unit())
            },
        );
        self.declare::<A>(name, params, ReturnKind::Void, type_name::<()>(), binding)
    }

    /// Declare a member returning `Result<V, E>`
    ///
    /// `Ok(v)` travels up the chain as a `V`; `Err(e)` travels as a
    /// [`Fault`](interpose_core::Fault) carrying the original `e`.
    pub fn method_fallible<A, V, E, F>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: FromArguments + 'static,
        V: Any + Send,
        E: StdError + Send + Sync + 'static,
        F: Fn(&T, A) -> Result<V, E> + Send + Sync + 'static,
    {
        let binding: Binding<T> = Arc::new(
            move |target: &T, envelope: &CallEnvelope| -> ProxyResult<Outcome> {
                let args = envelope.extract::<A>()?;
                match f(target, args) {
                    Ok(value) => Ok(Outcome::new(value)),
                    Err(e) => Err(ProxyError::fault(e)),
                }
            },
        );
        self.declare::<A>(
            name,
            params,
            ReturnKind::Value,
            type_name::<Result<V, E>>(),
            binding,
        )
    }

    /// Override whether the contract counts as interface-like
    ///
    /// Defaults to true exactly when `T` is unsized, which for a contract
    /// means a trait object.
    pub fn interface(mut self, interface: bool) -> Self {
        self.interface = interface;
        self
    }

    /// Attach an interceptor marker to the most recently declared member
    pub fn marker(mut self, marker: &str) -> Self {
        match self.members.pop() {
            Some((descriptor, binding)) => {
                self.members.push((descriptor.with_marker(marker), binding));
            }
            None => self
                .errors
                .push(format!("marker '{}' declared before any member", marker)),
        }
        self
    }

    fn declare<A: FromArguments>(
        mut self,
        name: &str,
        params: &[&str],
        return_kind: ReturnKind,
        return_type: &'static str,
        binding: Binding<T>,
    ) -> Self {
        if params.len() != A::ARITY {
            self.errors.push(format!(
                "{} declares {} parameter names for {} arguments",
                name,
                params.len(),
                A::ARITY
            ));
        }
        let params = params
            .iter()
            .zip(A::type_names())
            .map(|(param, ty)| ParamDescriptor::new(param, ty))
            .collect();
        let descriptor = MemberDescriptor::new(name, params, return_kind, return_type);
        self.members.push((descriptor, binding));
        self
    }

    /// Finish the contract
    ///
    /// # Errors
    ///
    /// `Configuration` if any declaration was malformed or two members share
    /// an identity.
    pub fn build(self) -> ProxyResult<Contract<T>> {
        if !self.errors.is_empty() {
            return Err(ProxyError::configuration(format!(
                "contract {}: {}",
                self.name,
                self.errors.join("; ")
            )));
        }

        let (descriptors, bindings): (Vec<_>, Vec<_>) = self.members.into_iter().unzip();
        let descriptor = ContractDescriptor::new(self.name, type_name::<T>(), descriptors)?
            .with_interface(self.interface);
        let members = descriptor
            .members()
            .iter()
            .cloned()
            .zip(bindings)
            .map(|(descriptor, binding)| Member {
                descriptor,
                binding,
            })
            .collect();

        Ok(Contract {
            descriptor: Arc::new(descriptor),
            members,
        })
    }
}
