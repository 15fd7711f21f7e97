use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::{CancelToken, OperationScheduler};

///
/// Smoothing: every output bin becomes the mean of the non-zero bins in
/// a window of `half_width` bins to each side. Windows are truncated at
/// the chromosome boundaries. A window with no data leaves the bin
/// empty; a window with data fills the bin even when the input bin was
/// empty, so small holes are interpolated across.
///
pub struct MovingAverage<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    half_width: usize,
}

impl<'a> MovingAverage<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        half_width: usize,
    ) -> Result<Self, OperationError> {
        if half_width == 0 {
            return Err(OperationError::EmptyWindow);
        }
        Ok(MovingAverage {
            scheduler,
            catalog,
            input,
            half_width,
        })
    }
}

impl Operation for MovingAverage<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let half_width = self.half_width;
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| smooth_bins(bins, half_width, token)
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
        format!("Moving average over {} bins", 2 * self.half_width + 1)
    }

    fn processing_label(&self) -> &'static str {
        "Smoothing scores"
    }

    fn step_count(&self) -> usize {
        1
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

pub(crate) fn smooth_bins(
    bins: &[f64],
    half_width: usize,
    token: &CancelToken,
) -> Result<Vec<f64>, OperationError> {
    let mut out = vec![0.0; bins.len()];
    for position in 0..bins.len() {
        token.check()?;
        let window_start = position.saturating_sub(half_width);
        let window_end = (position + half_width + 1).min(bins.len());
        let mut sum = 0.0;
        let mut count = 0u64;
        for &score in &bins[window_start..window_end] {
            if score != 0.0 {
                sum += score;
                count += 1;
            }
        }
        if count > 0 {
            out[position] = sum / count as f64;
        }
    }
    Ok(out)
}
