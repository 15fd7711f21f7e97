use crate::errors::OperationError;

///
/// The contract every numeric transform implements. An operation
/// validates its parameters at construction, decomposes itself into one
/// task per populated chromosome, runs the batch through the scheduler
/// and reduces the ordered partial results into its output.
///
/// `compute` blocks the calling thread until the result is ready and
/// returns `Ok(None)` when the run was aborted.
///
pub trait Operation {
    type Output;

    /// Run the operation to completion, cancellation or failure.
    fn compute(&self) -> Result<Option<Self::Output>, OperationError>;

    /// Human-readable summary of what the operation will do.
    fn description(&self) -> String;

    /// Short label for progress displays while the operation runs.
    fn processing_label(&self) -> &'static str;

    /// Number of scheduler rounds the operation performs, so a caller
    /// can scale a progress display across internal phases.
    fn step_count(&self) -> usize;

    /// Ask the scheduler to cancel the run in flight.
    fn request_stop(&self);
}
