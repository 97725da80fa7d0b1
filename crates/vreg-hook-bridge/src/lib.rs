//! Guest-side bridge between hooked registry calls and the virtual registry.
//!
//! This crate is the glue layer that a virtualized guest process runs when
//! one of its registry calls has been diverted away from the real OS API.
//! It translates guest handles, suppresses re-interception of its own
//! forwarding calls, invokes the virtual registry engine, and marshals
//! results back through the native two-phase buffer contract:
//!
//! ```text
//! [guest thread] --hooked call--> [extern "C" exports]
//!                                       |
//!                                 decode handle        (invalid: short-circuit)
//!                                       |
//!                                 scoped exclusion     (no re-interception)
//!                                       |
//!                                 [RegistryEngine]     (virtual store)
//!                                       |
//!                                 marshal outputs      (two-phase sizing)
//! ```
//!
//! The observable contract is bit-for-bit that of the real API, including
//! its documented defects; transparency beats cleanliness here, so quirky
//! branches are kept and tested rather than repaired.
//!
//! # Safety
//!
//! All raw-pointer handling is confined to [`guest_exports`]. The exports
//! follow these rules:
//!
//! 1. Pointers from the guest are validated for null before use
//! 2. Strings are NUL-terminated UTF-16, decoded up to the terminator
//! 3. Caller buffers are borrowed strictly for the call duration
//! 4. No unwind crosses the `extern "C"` boundary

#![warn(unsafe_op_in_unsafe_fn)]

mod bridge;
mod engine;
mod exclusion;
mod marshal;

pub mod guest_exports;
pub mod testing;

pub use bridge::{CreateKeyReply, OpenKeyReply, RegistryHookBridge};
pub use engine::RegistryEngine;
pub use exclusion::{ExclusionGuard, HookExclusion, ThreadMarkerExclusion};
pub use marshal::{write_value, QueryValueSink};
