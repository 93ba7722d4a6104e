//! The link that calls the real member

use std::fmt;

use interpose_core::{CallEnvelope, Outcome, ProxyResult};

use crate::contract::Member;
use crate::interceptor::{Interceptor, Next};

/// Final link of every chain
///
/// Invokes its member on the target with the envelope's arguments and never
/// calls `next`. A fault raised by the member is returned as-is.
pub struct TerminalInvoker<T: ?Sized> {
    member: Member<T>,
}

impl<T: ?Sized> TerminalInvoker<T> {
    /// Terminal for `member`
    pub fn new(member: Member<T>) -> Self {
        TerminalInvoker { member }
    }

    /// The member this terminal invokes
    pub fn member(&self) -> &Member<T> {
        &self.member
    }
}

impl<T: ?Sized> Interceptor<T> for TerminalInvoker<T> {
    fn name(&self) -> &str {
        "terminal"
    }

    fn intercept(
        &self,
        _next: Next<'_, T>,
        _method: &str,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<Outcome> {
        self.member.invoke(target, envelope)
    }

    fn intercept_void(
        &self,
        _next: Next<'_, T>,
        _method: &str,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<()> {
        self.member.invoke(target, envelope).map(|_| ())
    }
}

impl<T: ?Sized> fmt::Debug for TerminalInvoker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalInvoker")
            .field("member", &self.member.identity())
            .finish()
    }
}
