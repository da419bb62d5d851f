//! Vendor invocation abstractions.
//!
//! The orchestrator never talks to a data provider directly. A method
//! registration maps each vendor name to an [`Invoker`]; adapters for real
//! providers implement [`VendorAdapter`] and are bound per operation with
//! [`AdapterInvoker`]. HTTP or SDK calls live in the adapters, outside this
//! crate.

mod adapter;
mod operation;
mod traits;

pub use adapter::{invoker_fn, AdapterInvoker, FnInvoker};
pub use operation::Operation;
pub use traits::{Invoker, VendorAdapter};
