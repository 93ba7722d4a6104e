//! Proxy generation for interpose
//!
//! - InterceptorSource / InterceptorTable: which interceptors wrap which members
//! - MarkerCatalog / MarkerSource: declarative discovery from member markers
//! - InterceptorConfig: marker bindings from `interpose.toml`
//! - Dispatcher: the per-call router a proxy forwards to
//! - ProxyFactory / Proxyable: build once per contract, generate many proxies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod factory;
pub mod marker;
pub mod source;

pub use config::{InterceptorConfig, CONFIG_FILE_NAME};
pub use dispatcher::{Dispatcher, Route};
pub use factory::{ProxyFactory, Proxyable};
pub use marker::{MarkerCatalog, MarkerSource};
pub use source::{InterceptorSource, InterceptorTable};
