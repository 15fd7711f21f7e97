#[cfg(feature = "core")]
#[doc(inline)]
pub use bintrack_core as core;

#[cfg(feature = "ops")]
#[doc(inline)]
pub use bintrack_ops as ops;
