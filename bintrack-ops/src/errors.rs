use bintrack_core::errors::BinListError;
use thiserror::Error;

///
/// Errors produced while validating or running an operation. Parameter
/// variants are raised before any task is scheduled; `Computation` comes
/// out of a running task and cancels its siblings. `Cancelled` is an
/// in-flight marker only: an aborted run surfaces as `Ok(None)` from the
/// scheduler, never as an error.
///
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Low threshold {low} must be strictly below high threshold {high}")]
    InvalidThresholds { low: f64, high: f64 },

    #[error("Saturation bounds are inverted: {low} > {high}")]
    InvalidBounds { low: f64, high: f64 },

    #[error("Bin sizes differ between inputs: {0} vs {1}")]
    MismatchedBinSize(u32, u32),

    #[error("Chromosome counts differ between inputs: {0} vs {1}")]
    MismatchedChromosomeCount(usize, usize),

    #[error("Minimum run length must be at least one bin")]
    ZeroRunLength,

    #[error("Window must span at least one bin")]
    EmptyWindow,

    #[error("Density {0} must be within (0, 1]")]
    InvalidDensity(f64),

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Frame(#[from] BinListError),
}
