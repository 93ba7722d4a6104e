//! Interceptor discovery
//!
//! An [`InterceptorSource`] decides which interceptors wrap which members.
//! The factory asks it once per member while it is being built and never
//! again. [`InterceptorTable`] is the explicit, code-built strategy; see
//! [`MarkerSource`](crate::marker::MarkerSource) for the declarative one.

use std::fmt;
use std::sync::Arc;

use interpose_chain::Interceptor;
use interpose_core::{ContractDescriptor, MemberDescriptor};

/// Supplies interceptors for the members of a contract
pub trait InterceptorSource<T: ?Sized> {
    /// Every distinct interceptor this source can supply
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor<T>>>;

    /// Interceptors that wrap `member`, outermost first; empty if none
    fn find_matching_interceptors(
        &self,
        contract: &ContractDescriptor,
        member: &MemberDescriptor,
    ) -> Vec<Arc<dyn Interceptor<T>>>;
}

/// Returns true if both handles point at the same interceptor instance
pub(crate) fn same_instance<T: ?Sized>(
    a: &Arc<dyn Interceptor<T>>,
    b: &Arc<dyn Interceptor<T>>,
) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Explicit member-name to interceptor table
///
/// Interceptors registered with [`InterceptorTable::on_all`] wrap every
/// member and run outside the member-specific ones.
pub struct InterceptorTable<T: ?Sized> {
    all: Vec<Arc<dyn Interceptor<T>>>,
    members: Vec<(String, Vec<Arc<dyn Interceptor<T>>>)>,
}

impl<T: ?Sized> InterceptorTable<T> {
    /// Empty table
    pub fn new() -> Self {
        InterceptorTable {
            all: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Append `interceptor` to the chain of every member named `member`
    pub fn on(mut self, member: &str, interceptor: Arc<dyn Interceptor<T>>) -> Self {
        match self.members.iter_mut().find(|(name, _)| name == member) {
            Some((_, list)) => list.push(interceptor),
            None => self.members.push((member.to_string(), vec![interceptor])),
        }
        self
    }

    /// Append `interceptor` to the chain of every member
    pub fn on_all(mut self, interceptor: Arc<dyn Interceptor<T>>) -> Self {
        self.all.push(interceptor);
        self
    }

    /// Returns true if nothing was registered
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.members.is_empty()
    }
}

impl<T: ?Sized> Default for InterceptorTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> InterceptorSource<T> for InterceptorTable<T> {
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor<T>>> {
        let mut distinct: Vec<Arc<dyn Interceptor<T>>> = Vec::new();
        let listed = self
            .all
            .iter()
            .chain(self.members.iter().flat_map(|(_, list)| list.iter()));
        for interceptor in listed {
            if !distinct.iter().any(|seen| same_instance(seen, interceptor)) {
                distinct.push(Arc::clone(interceptor));
            }
        }
        distinct
    }

    fn find_matching_interceptors(
        &self,
        _contract: &ContractDescriptor,
        member: &MemberDescriptor,
    ) -> Vec<Arc<dyn Interceptor<T>>> {
        let specific = self
            .members
            .iter()
            .filter(|(name, _)| name == member.name())
            .flat_map(|(_, list)| list.iter());
        self.all.iter().chain(specific).cloned().collect()
    }
}

impl<T: ?Sized> fmt::Debug for InterceptorTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<(&str, usize)> = self
            .members
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("InterceptorTable")
            .field("all", &self.all.len())
            .field("members", &members)
            .finish()
    }
}
