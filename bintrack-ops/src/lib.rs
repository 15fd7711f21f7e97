//! Chromosome-parallel statistical and transform operations over binned
//! genome-wide score tracks.
//!
//! Every operation decomposes into one task per chromosome, runs the
//! batch on a shared bounded worker pool through the
//! [`OperationScheduler`], and reduces the ordered per-chromosome
//! partial results into its final value. The scheduler reports progress
//! weighted by chromosome length and supports cooperative cancellation
//! via [`OperationScheduler::abort`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bintrack_core::models::{BinList, Chromosome, ChromosomeCatalog, Precision};
//! use bintrack_ops::{Average, Operation, OperationScheduler};
//!
//! let catalog = ChromosomeCatalog::new(vec![Chromosome::new("chr1", 1000)]);
//! let track = BinList::from_scores(
//!     &catalog,
//!     100,
//!     Precision::Bit32,
//!     vec![Some(vec![1.0; 10])],
//! )
//! .unwrap();
//!
//! let scheduler = OperationScheduler::new();
//! let average = Average::new(&scheduler, &catalog, &track, None);
//! match average.compute().unwrap() {
//!     Some(value) => println!("average: {}", value),
//!     None => println!("cancelled"),
//! }
//! ```

pub mod errors;
pub mod operation;
pub mod ops;
pub mod progress;
pub mod scheduler;

// re-exports
pub use errors::OperationError;
pub use operation::Operation;
pub use ops::*;
pub use progress::{ProgressBarListener, ProgressEvent, ProgressListener};
pub use scheduler::{CancelToken, OperationScheduler, Task};
