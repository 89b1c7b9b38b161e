#![forbid(unsafe_code)]

//! Lenses: focus a state channel on part of its value.
//!
//! - [`Lens`]: a composable get/set pair.
//! - [`LensSource`]: a parent [`StateSource`](relay_core::StateSource) seen
//!   through a lens. Writes are one read-modify-write on the parent.
//! - [`FocusExt::focus`]: derive a child channel whose pulses are the
//!   parent's mutations mapped through the lens.
//! - [`collection`]: `index`, `range`, `prism`, and `at_key` lenses.
//! - [`select`]: keep a projection consistent with a channel of keys.

pub mod collection;
pub mod lens;
pub mod select;
pub mod source;

pub use collection::{MapFocusExt, VecFocusExt, at_key, index, prism, range};
pub use lens::Lens;
pub use select::{SelectExt, SelectSource, Selectable};
pub use source::{FocusExt, LensSource};
