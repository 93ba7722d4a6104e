//! Stable keys for contract members
//!
//! A [`MethodIdentity`] is the member name plus a signature hash. Two members
//! with the same identity are the same dispatch target. The hash disambiguates
//! members that share a name but differ in shape.

use std::fmt;
use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

/// Key for one member of a contract
///
/// Cheap to clone (the name is shared). Equality and hashing cover both the
/// name and the signature hash.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    name: Arc<str>,
    signature: u64,
}

impl MethodIdentity {
    /// Create an identity from a member name and its signature text
    ///
    /// The signature text is hashed with xxh3; any stable rendering of the
    /// member's shape works as long as it is used consistently.
    pub fn new(name: &str, signature: &str) -> Self {
        MethodIdentity {
            name: Arc::from(name),
            signature: xxh3_64(signature.as_bytes()),
        }
    }

    /// Create an identity from a member shape
    ///
    /// Renders `name(param, ...)->ret` and hashes it.
    pub fn from_shape(name: &str, param_types: &[&str], return_type: &str) -> Self {
        let signature = format!("{}({})->{}", name, param_types.join(","), return_type);
        Self::new(name, &signature)
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared member name
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Signature hash
    pub fn signature(&self) -> u64 {
        self.signature
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:016x}", self.name, self.signature)
    }
}

impl fmt::Debug for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodIdentity({})", self)
    }
}
