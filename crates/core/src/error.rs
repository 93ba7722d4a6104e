//! Error types for proxy construction and dispatch
//!
//! Build-time errors (`Configuration`, `DuplicateChain`) stop factory
//! construction. Dispatch-time errors propagate synchronously to whoever
//! called the proxy. Errors raised by a target member or an interceptor travel
//! as [`Fault`] and keep their original type.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::identity::MethodIdentity;

/// Result type alias for proxy operations
pub type ProxyResult<T> = std::result::Result<T, ProxyError>;

/// Errors raised while building or driving interceptor chains
///
/// # Categories
///
/// | Category | Variants | Raised |
/// |----------|----------|--------|
/// | Build | `Configuration`, `DuplicateChain` | factory / registry construction |
/// | Wiring | `UnregisteredChain`, `MissingMember` | first dispatch through a mismatched registry |
/// | Shape | `ArgumentMismatch`, `ArityMismatch`, `ReturnTypeMismatch`, `ChainExhausted` | an interceptor broke the member's shape |
/// | Inner | `Fault` | target member or interceptor failed |
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The contract or a source does not have the required shape
    #[error("configuration error: {reason}")]
    Configuration {
        /// What was wrong
        reason: String,
    },

    /// A chain is already registered for this member
    #[error("duplicate chain: {identity} is already registered")]
    DuplicateChain {
        /// Member whose chain was registered twice
        identity: MethodIdentity,
    },

    /// Dispatch referenced a member with no registered chain
    #[error("unregistered chain: no interceptors registered for {identity}")]
    UnregisteredChain {
        /// Member that was dispatched
        identity: MethodIdentity,
    },

    /// The member could not be resolved against its contract
    #[error("missing member: could not find {identity} in {contract}")]
    MissingMember {
        /// Member that was looked up
        identity: MethodIdentity,
        /// Contract it was looked up in
        contract: String,
    },

    /// A stored argument does not have the type the member expects
    #[error("argument mismatch: {method} argument {index} expected {expected}, got {actual}")]
    ArgumentMismatch {
        /// Member name
        method: String,
        /// Position of the argument
        index: usize,
        /// Type the binding expects
        expected: &'static str,
        /// Type that was stored
        actual: &'static str,
    },

    /// The envelope holds a different number of arguments than the member declares
    #[error("arity mismatch: {method} expected {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Member name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Argument count in the envelope
        actual: usize,
    },

    /// The chain produced a value of a different type than the member returns
    #[error("return type mismatch: {method} expected {expected}, got {actual}")]
    ReturnTypeMismatch {
        /// Member name
        method: String,
        /// Declared return type
        expected: &'static str,
        /// Type the chain produced
        actual: &'static str,
    },

    /// An interceptor asked for the next link after the terminal invoker
    #[error("chain exhausted: {method} has no link after the terminal invoker")]
    ChainExhausted {
        /// Member name
        method: String,
    },

    /// Error raised by the target member or an interceptor
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl ProxyError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        ProxyError::Configuration {
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary error as an inner fault
    pub fn fault<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ProxyError::Fault(Fault::new(error))
    }

    /// Returns true if this error originated inside a target or interceptor
    pub fn is_fault(&self) -> bool {
        matches!(self, ProxyError::Fault(_))
    }
}

/// An error raised by a target member or an interceptor
///
/// The original error is kept boxed and can be recovered by value with
/// [`Fault::downcast`]. `Display` and `source` delegate to it, so a fault
/// reads exactly like the error it carries.
pub struct Fault(Box<dyn StdError + Send + Sync + 'static>);

impl Fault {
    /// Wrap an error
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Fault(Box::new(error))
    }

    /// Create a fault from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Fault(message.into())
    }

    /// Returns true if the carried error is an `E`
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    /// Borrow the carried error as an `E`
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Recover the carried error by value
    ///
    /// Returns the fault unchanged if it carries some other type.
    pub fn downcast<E: StdError + 'static>(self) -> std::result::Result<E, Fault> {
        self.0.downcast::<E>().map(|e| *e).map_err(Fault)
    }

    /// Unwrap into the boxed error
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}
