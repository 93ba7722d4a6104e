//! The interceptor capability and the per-call chain cursor
//!
//! A chain is an ordered slice of links. Every call walks it with its own
//! [`Next`] cursor, so one chain can serve many concurrent calls and be
//! re-entered from inside one of its own links. The last link is always a
//! terminal that ends the walk.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use interpose_core::{CallEnvelope, Outcome, ProxyError, ProxyResult};

/// A unit of cross-cutting behaviour around members of `T`
///
/// An interceptor may call `next` zero times (short-circuit), once, or
/// several times, and may replace the arguments or the result. Faults raised
/// further down arrive as `Err(ProxyError::Fault(..))` and can be inspected,
/// replaced or passed on.
///
/// For a trait-object contract the target is spelled with its `'static`
/// object bound, matching `T`. A bare `&dyn Svc` names a shorter-lived
/// object that cannot be handed on to `next`.
///
/// ```ignore
/// struct Audit;
///
/// impl Interceptor<dyn Svc> for Audit {
///     fn intercept(
///         &self,
///         next: Next<'_, dyn Svc>,
///         method: &str,
///         envelope: &CallEnvelope,
///         target: &(dyn Svc + 'static),
///     ) -> ProxyResult<Outcome> {
///         tracing::info!(method, "audited");
///         next.proceed(method, envelope, target)
///     }
/// }
/// ```
pub trait Interceptor<T: ?Sized>: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Handle a value-returning call
    fn intercept(
        &self,
        next: Next<'_, T>,
        method: &str,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<Outcome>;

    /// Handle a call that returns nothing
    ///
    /// The default runs [`Interceptor::intercept`] and drops the unit
    /// outcome the terminal produces for void members.
    fn intercept_void(
        &self,
        next: Next<'_, T>,
        method: &str,
        envelope: &CallEnvelope,
        target: &T,
    ) -> ProxyResult<()> {
        self.intercept(next, method, envelope, target).map(|_| ())
    }
}

/// Position in a chain for one call
pub struct Next<'a, T: ?Sized> {
    links: &'a [Arc<dyn Interceptor<T>>],
    position: usize,
}

impl<'a, T: ?Sized> Next<'a, T> {
    /// Cursor at `position` in `links`
    pub fn new(links: &'a [Arc<dyn Interceptor<T>>], position: usize) -> Self {
        Next { links, position }
    }

    /// Index of the link this cursor points at
    pub fn position(&self) -> usize {
        self.position
    }

    /// Links left to run, terminal included
    pub fn remaining(&self) -> usize {
        self.links.len().saturating_sub(self.position)
    }

    /// The link this cursor points at
    pub fn peek(&self) -> Option<&'a dyn Interceptor<T>> {
        self.links.get(self.position).map(|link| &**link)
    }

    /// The current link and a cursor just past it
    pub fn advance(self) -> Option<(&'a dyn Interceptor<T>, Next<'a, T>)> {
        let link = self.peek()?;
        Some((
            link,
            Next {
                links: self.links,
                position: self.position + 1,
            },
        ))
    }

    /// Run the rest of the chain for a value-returning call
    ///
    /// # Errors
    ///
    /// `ChainExhausted` if the cursor is past the terminal, otherwise
    /// whatever the remaining links return.
    pub fn proceed(self, method: &str, envelope: &CallEnvelope, target: &T) -> ProxyResult<Outcome> {
        match self.advance() {
            Some((link, next)) => link.intercept(next, method, envelope, target),
            None => Err(ProxyError::ChainExhausted {
                method: method.to_string(),
            }),
        }
    }

    /// Run the rest of the chain for a call that returns nothing
    pub fn proceed_void(self, method: &str, envelope: &CallEnvelope, target: &T) -> ProxyResult<()> {
        match self.advance() {
            Some((link, next)) => link.intercept_void(next, method, envelope, target),
            None => Err(ProxyError::ChainExhausted {
                method: method.to_string(),
            }),
        }
    }
}

impl<T: ?Sized> Clone for Next<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Next<'_, T> {}

impl<T: ?Sized> fmt::Debug for Next<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("remaining", &self.remaining())
            .finish()
    }
}
