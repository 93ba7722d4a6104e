//! Type-erased argument values
//!
//! Arguments travel through a chain as [`Arg`]s: owned values of any
//! `'static + Debug + Send + Sync` type. Positional tuples convert into an
//! argument list at the call site ([`IntoArguments`]) and back out of one in
//! the terminal binding ([`FromArguments`]).
//!
//! Extraction clones the stored value, so the envelope stays intact for
//! interceptors that call the rest of the chain more than once.

use std::any::{type_name, Any};
use std::fmt;

use smallvec::SmallVec;

use crate::error::{ProxyError, ProxyResult};

/// Inline storage for a call's arguments
pub type Arguments = SmallVec<[Arg; 4]>;

/// Object-safe view of an argument value
pub trait ArgValue: Any + fmt::Debug + Send + Sync {
    /// Upcast to `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<V> ArgValue for V
where
    V: Any + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One raw argument value
pub struct Arg {
    value: Box<dyn ArgValue>,
    type_name: &'static str,
}

impl Arg {
    /// Wrap a value
    pub fn new<V>(value: V) -> Self
    where
        V: Any + fmt::Debug + Send + Sync,
    {
        Arg {
            value: Box::new(value),
            type_name: type_name::<V>(),
        }
    }

    /// Rust type name of the stored value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the stored value is a `V`
    pub fn is<V: Any>(&self) -> bool {
        self.any().is::<V>()
    }

    /// Borrow the stored value as a `V`
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.any().downcast_ref::<V>()
    }

    fn any(&self) -> &dyn Any {
        // Bind through `&dyn ArgValue` so the call reaches the stored value,
        // not the blanket impl for `Box<dyn ArgValue>`.
        let value: &dyn ArgValue = &*self.value;
        value.as_any()
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

/// Convert a positional tuple into an argument list
pub trait IntoArguments {
    /// Number of values in the tuple
    const ARITY: usize;

    /// Move every value into an argument list
    fn into_arguments(self) -> Arguments;
}

/// Rebuild a positional tuple from an argument list
pub trait FromArguments: Sized {
    /// Number of values in the tuple
    const ARITY: usize;

    /// Rust type names of each position
    fn type_names() -> Vec<&'static str>;

    /// Clone every value out of `args`
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if the list has the wrong length, `ArgumentMismatch`
    /// if a value has the wrong type.
    fn from_arguments(method: &str, args: &[Arg]) -> ProxyResult<Self>;
}

fn extract<V>(method: &str, args: &[Arg], index: usize) -> ProxyResult<V>
where
    V: Any + Clone,
{
    let arg = args.get(index).ok_or_else(|| ProxyError::ArityMismatch {
        method: method.to_string(),
        expected: index + 1,
        actual: args.len(),
    })?;
    arg.downcast_ref::<V>()
        .cloned()
        .ok_or_else(|| ProxyError::ArgumentMismatch {
            method: method.to_string(),
            index,
            expected: type_name::<V>(),
            actual: arg.type_name(),
        })
}

macro_rules! tuple_arguments {
    ($count:expr; $($name:ident : $index:tt),*) => {
        impl<$($name),*> IntoArguments for ($($name,)*)
        where
            $($name: Any + fmt::Debug + Send + Sync,)*
        {
            const ARITY: usize = $count;

            #[allow(unused_mut)]
            fn into_arguments(self) -> Arguments {
                let mut args = Arguments::new();
                $(args.push(Arg::new(self.$index));)*
                args
            }
        }

        impl<$($name),*> FromArguments for ($($name,)*)
        where
            $($name: Any + Clone + fmt::Debug + Send + Sync,)*
        {
            const ARITY: usize = $count;

            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$name>()),*]
            }

            fn from_arguments(method: &str, args: &[Arg]) -> ProxyResult<Self> {
                if args.len() != $count {
                    return Err(ProxyError::ArityMismatch {
                        method: method.to_string(),
                        expected: $count,
                        actual: args.len(),
                    });
                }
                Ok(($(extract::<$name>(method, args, $index)?,)*))
            }
        }
    };
}

tuple_arguments!(0;);
tuple_arguments!(1; A: 0);
tuple_arguments!(2; A: 0, B: 1);
tuple_arguments!(3; A: 0, B: 1, C: 2);
tuple_arguments!(4; A: 0, B: 1, C: 2, D: 3);
tuple_arguments!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_arguments!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_arguments!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_arguments!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
