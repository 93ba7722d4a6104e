//! Contract metadata
//!
//! A contract is an interface-shaped set of members. This module only holds
//! the read-only description (names, parameter names and types, return kind);
//! the callable bindings live with the chain builder.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{ProxyError, ProxyResult};
use crate::identity::MethodIdentity;

/// How a member returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Returns nothing
    Void,
    /// Returns a value
    Value,
    /// Returns a future-like handle, forwarded as an ordinary value
    Future,
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: Arc<str>,
    type_name: &'static str,
}

impl ParamDescriptor {
    /// Create a parameter descriptor
    pub fn new(name: &str, type_name: &'static str) -> Self {
        ParamDescriptor {
            name: Arc::from(name),
            type_name,
        }
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared parameter name
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Rust type name of the parameter
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Description of one member
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    identity: MethodIdentity,
    params: Vec<ParamDescriptor>,
    return_kind: ReturnKind,
    return_type: &'static str,
    markers: Vec<String>,
}

impl MemberDescriptor {
    /// Create a member descriptor; the identity is derived from the shape
    pub fn new(
        name: &str,
        params: Vec<ParamDescriptor>,
        return_kind: ReturnKind,
        return_type: &'static str,
    ) -> Self {
        let param_types: Vec<&str> = params.iter().map(|p| p.type_name()).collect();
        MemberDescriptor {
            identity: MethodIdentity::from_shape(name, &param_types, return_type),
            params,
            return_kind,
            return_type,
            markers: Vec::new(),
        }
    }

    /// Attach a declarative interceptor marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    /// Member identity
    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Declared parameters, in order
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Return kind
    pub fn return_kind(&self) -> ReturnKind {
        self.return_kind
    }

    /// Rust type name of the return value (`()` for void members)
    pub fn return_type(&self) -> &'static str {
        self.return_type
    }

    /// Interceptor markers, in declaration order
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Read-only description of a whole contract
///
/// Member identities are unique within a contract.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    name: String,
    type_name: &'static str,
    interface: bool,
    members: Vec<MemberDescriptor>,
    index: FxHashMap<MethodIdentity, usize>,
}

impl ContractDescriptor {
    /// Create a contract description
    ///
    /// The description is not interface-like until marked with
    /// [`ContractDescriptor::with_interface`].
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the name is empty or two members share an
    /// identity.
    pub fn new(
        name: impl Into<String>,
        type_name: &'static str,
        members: Vec<MemberDescriptor>,
    ) -> ProxyResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProxyError::configuration("contract name must not be empty"));
        }

        let mut index = FxHashMap::default();
        for (position, member) in members.iter().enumerate() {
            if index.insert(member.identity().clone(), position).is_some() {
                return Err(ProxyError::configuration(format!(
                    "member {} is declared twice in {}",
                    member.identity(),
                    name
                )));
            }
        }

        Ok(ContractDescriptor {
            name,
            type_name,
            interface: false,
            members,
            index,
        })
    }

    /// Mark whether the target type is a trait object
    pub fn with_interface(mut self, interface: bool) -> Self {
        self.interface = interface;
        self
    }

    /// Contract name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type name of the proxied target, for diagnostics only
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the target type is a trait object
    ///
    /// Declarative discovery only accepts interface-like contracts.
    pub fn is_interface(&self) -> bool {
        self.interface
    }

    /// All members, in declaration order
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Look up a member by identity
    pub fn member(&self, identity: &MethodIdentity) -> Option<&MemberDescriptor> {
        self.index.get(identity).map(|&i| &self.members[i])
    }

    /// Position of a member in declaration order
    pub fn position(&self, identity: &MethodIdentity) -> Option<usize> {
        self.index.get(identity).copied()
    }

    /// First member with the given name
    pub fn member_named(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name() == name)
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
