// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The context model (`spec.md` §4.6, component C6): a named, zero-sized
//! policy tag carried through every dispatch call, plus a task-scoped
//! ambient default realized with a `thread_local!` cell and an RAII guard —
//! never a global mutable `static`.

use std::cell::Cell;

use crate::typedesc::TypeDescriptor;

/// A named policy bundle that parameterizes format/type-binding dispatch.
///
/// Implementors are zero-sized marker types; `Context` values carry no
/// runtime state of their own; `DefaultContext` is the library-provided
/// dispatch sentinel and must never be named in a user override of
/// `Formatted`/`StructFormat` — it exists only so that types with no
/// context-specific binding still resolve to *something*.
pub trait Context: Copy + Clone + Default + Send + Sync + 'static {
    /// A stable, human-readable name used in error messages and by
    /// [`ambient_context_name`].
    const NAME: &'static str;

    /// Whether a type reconstructed via `Typed`/`TypeFmt` under this context
    /// is permitted to be instantiated (`spec.md` §4.3.8 "Safety"). The
    /// default is permissive; contexts that need a whitelist override this.
    fn allow_reconstruct(_desc: &TypeDescriptor) -> bool {
        true
    }
}

/// The dispatch sentinel context. Carries no policy of its own; binding a
/// type's format under `DefaultContext` is what callers get when they don't
/// ask for anything more specific.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultContext;

impl Context for DefaultContext {
    const NAME: &'static str = "DefaultContext";
}

thread_local! {
    static AMBIENT: Cell<&'static str> = const { Cell::new(DefaultContext::NAME) };
}

/// An RAII guard restoring the previous ambient context name on drop.
///
/// Obtained from [`enter`]. Scoping is lexical: the ambient context reverts
/// the moment the guard is dropped, so nested `enter::<C>()` calls compose
/// correctly even across early returns and panics.
#[must_use = "the ambient context reverts as soon as this guard is dropped"]
pub struct ContextGuard {
    previous: &'static str,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        AMBIENT.with(|cell| cell.set(self.previous));
    }
}

/// Enter context `C` as the task-scoped ambient default for the lifetime of
/// the returned guard. Two concurrent pack/unpack operations on different
/// threads each see their own ambient context (`spec.md` §5).
pub fn enter<C: Context>() -> ContextGuard {
    let previous = AMBIENT.with(|cell| cell.replace(C::NAME));
    ContextGuard { previous }
}

/// The name of the currently ambient context, for diagnostics. Dispatch
/// itself is resolved generically at compile time via `C: Context` type
/// parameters; this is an observability hook, not a dynamic dispatch path.
#[must_use]
pub fn ambient_context_name() -> &'static str {
    AMBIENT.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, Default)]
    struct Strict;
    impl Context for Strict {
        const NAME: &'static str = "Strict";
    }

    #[test]
    fn ambient_defaults_and_restores() {
        assert_eq!(ambient_context_name(), "DefaultContext");
        {
            let _g = enter::<Strict>();
            assert_eq!(ambient_context_name(), "Strict");
        }
        assert_eq!(ambient_context_name(), "DefaultContext");
    }

    #[test]
    fn ambient_nests() {
        let _outer = enter::<Strict>();
        assert_eq!(ambient_context_name(), "Strict");
        {
            let _inner = enter::<DefaultContext>();
            assert_eq!(ambient_context_name(), "DefaultContext");
        }
        assert_eq!(ambient_context_name(), "Strict");
    }
}
