//! Per-call argument carrier
//!
//! A [`CallEnvelope`] owns the raw argument values of one call. The
//! name/value view is resolved against the contract on first access and
//! cached for the life of the envelope; resolving it never touches the raw
//! values.
//!
//! Envelopes are immutable. An interceptor that wants to forward different
//! arguments derives a new envelope with [`CallEnvelope::with_arguments`].

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::args::{Arg, Arguments, FromArguments, IntoArguments};
use crate::contract::ContractDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::identity::MethodIdentity;

/// Arguments of one call, plus a lazily resolved name view
pub struct CallEnvelope {
    contract: Arc<ContractDescriptor>,
    identity: MethodIdentity,
    args: Arguments,
    names: OnceCell<Vec<Arc<str>>>,
}

impl CallEnvelope {
    /// Create an envelope, taking ownership of `args`
    pub fn new(contract: Arc<ContractDescriptor>, identity: MethodIdentity, args: Arguments) -> Self {
        CallEnvelope {
            contract,
            identity,
            args,
            names: OnceCell::new(),
        }
    }

    /// Create an envelope from a positional tuple
    pub fn pack<A: IntoArguments>(
        contract: Arc<ContractDescriptor>,
        identity: MethodIdentity,
        args: A,
    ) -> Self {
        Self::new(contract, identity, args.into_arguments())
    }

    /// Contract the call belongs to
    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }

    /// Identity of the called member
    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    /// Name of the called member
    pub fn method(&self) -> &str {
        self.identity.name()
    }

    /// Raw argument values, in call order
    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if the call has no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Borrow one argument as a `V`
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if `index` is out of range, `ArgumentMismatch` if the
    /// value is not a `V`.
    pub fn argument<V: Any>(&self, index: usize) -> ProxyResult<&V> {
        let arg = self.args.get(index).ok_or_else(|| ProxyError::ArityMismatch {
            method: self.method().to_string(),
            expected: index + 1,
            actual: self.args.len(),
        })?;
        arg.downcast_ref::<V>()
            .ok_or_else(|| ProxyError::ArgumentMismatch {
                method: self.method().to_string(),
                index,
                expected: type_name::<V>(),
                actual: arg.type_name(),
            })
    }

    /// Clone all arguments out as a positional tuple
    pub fn extract<A: FromArguments>(&self) -> ProxyResult<A> {
        A::from_arguments(self.method(), &self.args)
    }

    /// Argument names paired with their values
    ///
    /// Parameter names are resolved against the contract on the first call
    /// and reused afterwards.
    ///
    /// # Errors
    ///
    /// `MissingMember` if the identity is not part of the contract,
    /// `ArityMismatch` if the argument count differs from the declaration.
    pub fn named_arguments(&self) -> ProxyResult<NamedArguments<'_>> {
        let names = self.names.get_or_try_init(|| self.resolve_names())?;
        Ok(NamedArguments {
            names,
            args: &self.args,
        })
    }

    fn resolve_names(&self) -> ProxyResult<Vec<Arc<str>>> {
        let member = self
            .contract
            .member(&self.identity)
            .ok_or_else(|| ProxyError::MissingMember {
                identity: self.identity.clone(),
                contract: self.contract.name().to_string(),
            })?;
        if member.arity() != self.args.len() {
            return Err(ProxyError::ArityMismatch {
                method: self.method().to_string(),
                expected: member.arity(),
                actual: self.args.len(),
            });
        }
        Ok(member.params().iter().map(|p| p.shared_name()).collect())
    }

    /// Derive an envelope for the same member with different arguments
    pub fn with_arguments(&self, args: Arguments) -> CallEnvelope {
        CallEnvelope::new(Arc::clone(&self.contract), self.identity.clone(), args)
    }

    /// Take the raw argument values
    pub fn into_arguments(self) -> Arguments {
        self.args
    }
}

impl fmt::Debug for CallEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallEnvelope")
            .field("identity", &self.identity)
            .field("args", &self.args)
            .finish()
    }
}

/// Borrowed name/value view of an envelope
#[derive(Clone, Copy)]
pub struct NamedArguments<'a> {
    names: &'a [Arc<str>],
    args: &'a [Arg],
}

impl<'a> NamedArguments<'a> {
    /// Parameter names, in order
    pub fn names(&self) -> &'a [Arc<str>] {
        self.names
    }

    /// Value of the named argument
    pub fn get(&self, name: &str) -> Option<&'a Arg> {
        self.iter().find(|(n, _)| *n == name).map(|(_, arg)| arg)
    }

    /// (name, value) pairs, in order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Arg)> + 'a {
        let (names, args) = (self.names, self.args);
        names.iter().map(|n| &**n).zip(args.iter())
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if there are no pairs
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for NamedArguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
