//! Interpose - interceptor chains and dispatch proxies for trait objects
//!
//! Interpose wraps calls to a trait object in an ordered chain of
//! interceptors (caching, logging, retry, ...) without touching the
//! implementation or its callers.
//!
//! # Quick Start
//!
//! ```ignore
//! use interpose::{Contract, Dispatcher, InterceptorTable, ProxyFactory, Proxyable};
//!
//! // Describe the contract once
//! impl Proxyable for dyn Greeter {
//!     fn contract() -> ProxyResult<Arc<Contract<Self>>> { /* Contract::builder(..).build() */ }
//!     fn from_dispatcher(d: Dispatcher<Self>) -> Arc<Self> { Arc::new(d) }
//! }
//!
//! // Build a factory once, then proxy any number of targets
//! let table = InterceptorTable::new().on("greet", Arc::new(Logging));
//! let factory = ProxyFactory::<dyn Greeter>::new(&table)?;
//! let greeter = factory.generate_proxy(Arc::new(English));
//! greeter.greet("alice".into());
//! ```
//!
//! # Architecture
//!
//! - `interpose-core`: identities, contract metadata, envelopes, errors
//! - `interpose-chain`: typed contracts, interceptors, chain registries
//! - `interpose-proxy`: interceptor sources, dispatchers, factories

pub use interpose_chain::{
    ChainRegistry, Contract, ContractBuilder, Interceptor, InterceptorChain, InterceptorManager,
    Member, Next, TerminalInvoker,
};
pub use interpose_core::{
    Arg, ArgValue, Arguments, CallEnvelope, ContractDescriptor, Fault, FromArguments,
    IntoArguments, MemberDescriptor, MethodIdentity, NamedArguments, Outcome, ParamDescriptor,
    ProxyError, ProxyResult, ReturnKind,
};
pub use interpose_proxy::{
    Dispatcher, InterceptorConfig, InterceptorSource, InterceptorTable, MarkerCatalog,
    MarkerSource, ProxyFactory, Proxyable, Route, CONFIG_FILE_NAME,
};
