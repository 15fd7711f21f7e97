use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::{CancelToken, OperationScheduler};

///
/// Keep runs of consecutive bins whose score falls inside `[low, high)`;
/// a run shorter than `min_run` bins is zeroed out entirely, a run
/// meeting the minimum is copied through unchanged. Bins outside the
/// band always become 0.
///
pub struct ThresholdFilter<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    low: f64,
    high: f64,
    min_run: usize,
}

impl<'a> ThresholdFilter<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        low: f64,
        high: f64,
        min_run: usize,
    ) -> Result<Self, OperationError> {
        if low >= high {
            return Err(OperationError::InvalidThresholds { low, high });
        }
        if min_run == 0 {
            return Err(OperationError::ZeroRunLength);
        }
        Ok(ThresholdFilter {
            scheduler,
            catalog,
            input,
            low,
            high,
            min_run,
        })
    }
}

impl Operation for ThresholdFilter<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let (low, high, min_run) = (self.low, self.high, self.min_run);
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| filter_bins(bins, low, high, min_run, token)
        })?
        else {
            return Ok(None);
        };
        let result = BinList::from_scores(
            self.catalog,
            self.input.bin_size(),
            self.input.precision(),
            rebuilt,
        )?;
        Ok(Some(result))
    }

    fn description(&self) -> String {
        format!(
            "Threshold filter, keep runs of at least {} bins in [{}, {})",
            self.min_run, self.low, self.high
        )
    }

    fn processing_label(&self) -> &'static str {
        "Filtering by threshold"
    }

    fn step_count(&self) -> usize {
        1
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

/// Single left-to-right pass tracking the current in-band run. The
/// virtual position one past the end closes a run that reaches the
/// array boundary.
pub(crate) fn filter_bins(
    bins: &[f64],
    low: f64,
    high: f64,
    min_run: usize,
    token: &CancelToken,
) -> Result<Vec<f64>, OperationError> {
    let mut out = vec![0.0; bins.len()];
    let mut run_start: Option<usize> = None;
    for position in 0..=bins.len() {
        token.check()?;
        let inside = position < bins.len() && bins[position] >= low && bins[position] < high;
        if inside {
            if run_start.is_none() {
                run_start = Some(position);
            }
        } else if let Some(start) = run_start.take() {
            if position - start >= min_run {
                out[start..position].copy_from_slice(&bins[start..position]);
            }
        }
    }
    Ok(out)
}
