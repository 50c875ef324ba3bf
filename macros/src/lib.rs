//! Run synchronous and asynchronous tests with tracing output.

pub use bytecraft_macros_impl::{test_async, test_traced};

// Hidden from docs because these are needed for the proc macros to use 3rd
// party crates.
#[doc(hidden)]
pub use ::futures;
#[doc(hidden)]
pub use ::tracing;
#[doc(hidden)]
pub use ::tracing_subscriber;
