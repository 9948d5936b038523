//! Capability-dispatched cloning.
//!
//! Every clonable model type declares how it wants to be copied through
//! [`Cloneable::strategy`]. [`clone`] then picks the cheapest correct path:
//!
//! - [`CloneStrategy::Immutable`] values are shared, the returned `Arc` is
//!   pointer-equal to the input.
//! - [`CloneStrategy::SelfCloning`] values produce their own copy.
//! - [`CloneStrategy::Structural`] values are deep-copied node by node.
//! - [`CloneStrategy::Unsupported`] is rejected with [`CloneError`].

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CloneError {
    #[error("illegal argument: {type_name} is neither immutable, self-cloning nor structurally copyable")]
    Unsupported { type_name: &'static str },
    #[error("illegal argument: {type_name} declared {strategy:?} but did not provide a copy")]
    MissingCopy {
        type_name: &'static str,
        strategy: CloneStrategy,
    },
}

/// How a value wants to be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloneStrategy {
    Immutable,
    SelfCloning,
    Structural,
    Unsupported,
}

/// A value whose copy behaviour is declared explicitly.
pub trait Cloneable: Sized {
    fn strategy(&self) -> CloneStrategy;

    /// The type's own copy operation. Required for [`CloneStrategy::SelfCloning`].
    fn self_clone(&self) -> Option<Self> {
        None
    }

    /// Generic deep copy. Required for [`CloneStrategy::Structural`].
    fn structural_copy(&self) -> Option<Self> {
        None
    }
}

/// Clones `value` according to its declared [`CloneStrategy`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_util::clone::{clone, Cloneable, CloneStrategy};
///
/// #[derive(Debug, PartialEq)]
/// struct Tag(&'static str);
///
/// impl Cloneable for Tag {
///     fn strategy(&self) -> CloneStrategy {
///         CloneStrategy::Immutable
///     }
/// }
///
/// let tag = Arc::new(Tag("a"));
/// let copy = clone(&tag).unwrap();
/// assert!(Arc::ptr_eq(&tag, &copy));
/// ```
pub fn clone<T: Cloneable>(value: &Arc<T>) -> Result<Arc<T>, CloneError> {
    let strategy = value.strategy();
    let copied = match strategy {
        CloneStrategy::Immutable => return Ok(Arc::clone(value)),
        CloneStrategy::SelfCloning => value.self_clone(),
        CloneStrategy::Structural => value.structural_copy(),
        CloneStrategy::Unsupported => {
            return Err(CloneError::Unsupported {
                type_name: std::any::type_name::<T>(),
            })
        }
    };
    copied.map(Arc::new).ok_or(CloneError::MissingCopy {
        type_name: std::any::type_name::<T>(),
        strategy,
    })
}

/// Clones a plain value, producing an owned copy.
///
/// Immutable values still need an owned instance here, so they fall back to
/// the structural or self copy they provide, or fail.
pub fn clone_owned<T: Cloneable>(value: &T) -> Result<T, CloneError> {
    let strategy = value.strategy();
    let copied = match strategy {
        CloneStrategy::SelfCloning => value.self_clone(),
        CloneStrategy::Structural | CloneStrategy::Immutable => value
            .structural_copy()
            .or_else(|| value.self_clone()),
        CloneStrategy::Unsupported => None,
    };
    copied.ok_or(CloneError::Unsupported {
        type_name: std::any::type_name::<T>(),
    })
}
