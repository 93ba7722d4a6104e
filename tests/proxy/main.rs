//! Proxy Integration Tests
//!
//! End-to-end tests through the public facade: factories, dispatch routes,
//! chain ordering, discovery and concurrent use.

mod common;

mod registry;
