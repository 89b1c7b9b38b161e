#![forbid(unsafe_code)]

//! Relay public facade crate.
//!
//! Re-exports the core channel algebra and, with the `lens` feature (on by
//! default), the lens layer. Most programs only need the [`prelude`].
//!
//! ```
//! use relay::prelude::*;
//!
//! let cell = Transceiver::new((0u8, String::from("idle")));
//! let status = cell
//!     .channel()
//!     .focus_with(|s: &(u8, String)| s.1.clone(), |s, label| (s.0, label));
//!
//! status.set_value("busy".into());
//! assert_eq!(cell.get().1, "busy");
//! ```

pub use relay_core as core;
#[cfg(feature = "lens")]
pub use relay_lens as lens;

pub use relay_core::{
    Channel, Choice2, Choice3, Choice4, Choice5, Choice6, Emitter, EventSource, Mutation,
    QueueConfig, Receipt, ReceiptGuard, RelayError, StateSource, Transceiver,
};

pub mod prelude {
    pub use relay_core::{
        Channel, Choice2, Choice3, Choice4, Choice5, Choice6, DispatchOptions, Emitter,
        EventSource, Executor, FlattenChoice, ImmediateExecutor, LockKind, Mutation, QueueConfig,
        Receipt, ReceiptGuard, Receiver, RelayError, StateSource, Transceiver,
    };

    #[cfg(feature = "lens")]
    pub use relay_lens::{FocusExt, Lens, LensSource, MapFocusExt, SelectExt, VecFocusExt};
}
