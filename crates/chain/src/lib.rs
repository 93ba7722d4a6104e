//! Interceptor chains for interpose
//!
//! This crate turns contract metadata into runnable chains:
//! - Contract / ContractBuilder: typed member bindings over a target `T`
//! - Interceptor / Next: the wrapping capability and its per-call cursor
//! - TerminalInvoker: the final link that calls the real member
//! - InterceptorManager / ChainRegistry: chain storage keyed by member identity

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod interceptor;
pub mod registry;
pub mod terminal;

pub use contract::{Contract, ContractBuilder, Member};
pub use interceptor::{Interceptor, Next};
pub use registry::{ChainRegistry, InterceptorChain, InterceptorManager};
pub use terminal::TerminalInvoker;
