//! Core types for interpose
//!
//! This crate defines the foundational types used throughout the system:
//! - MethodIdentity: stable key for one contract member
//! - ContractDescriptor / MemberDescriptor / ParamDescriptor: read-only contract metadata
//! - Arg / IntoArguments / FromArguments: type-erased argument values
//! - CallEnvelope: per-call argument carrier with a lazy name view
//! - Outcome: type-erased return value
//! - ProxyError / Fault: error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod contract;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod outcome;

pub use args::{Arg, ArgValue, Arguments, FromArguments, IntoArguments};
pub use contract::{ContractDescriptor, MemberDescriptor, ParamDescriptor, ReturnKind};
pub use envelope::{CallEnvelope, NamedArguments};
pub use error::{Fault, ProxyError, ProxyResult};
pub use identity::MethodIdentity;
pub use outcome::Outcome;
