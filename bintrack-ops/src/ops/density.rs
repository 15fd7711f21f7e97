use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::{CancelToken, OperationScheduler};

///
/// Density variant of the threshold filter: the chromosome is scanned in
/// windows of `region_size` bins, and a window is copied through only
/// when enough of its bins fall inside `[low, high)`. The window at the
/// right boundary is truncated, not padded, and its own length scales
/// the requirement.
///
pub struct DensityFilter<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    low: f64,
    high: f64,
    density: f64,
    region_size: usize,
}

impl<'a> DensityFilter<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        low: f64,
        high: f64,
        density: f64,
        region_size: usize,
    ) -> Result<Self, OperationError> {
        if low >= high {
            return Err(OperationError::InvalidThresholds { low, high });
        }
        if !(density > 0.0 && density <= 1.0) {
            return Err(OperationError::InvalidDensity(density));
        }
        if region_size == 0 {
            return Err(OperationError::EmptyWindow);
        }
        Ok(DensityFilter {
            scheduler,
            catalog,
            input,
            low,
            high,
            density,
            region_size,
        })
    }
}

impl Operation for DensityFilter<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let (low, high, density, region_size) = (self.low, self.high, self.density, self.region_size);
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| density_filter_bins(bins, low, high, density, region_size, token)
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
            "Density filter, windows of {} bins with density {} in [{}, {})",
            self.region_size, self.density, self.low, self.high
        )
    }

    fn processing_label(&self) -> &'static str {
        "Filtering by density"
    }

    fn step_count(&self) -> usize {
        1
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

pub(crate) fn density_filter_bins(
    bins: &[f64],
    low: f64,
    high: f64,
    density: f64,
    region_size: usize,
    token: &CancelToken,
) -> Result<Vec<f64>, OperationError> {
    let mut out = vec![0.0; bins.len()];
    for start in (0..bins.len()).step_by(region_size) {
        token.check()?;
        let end = (start + region_size).min(bins.len());
        let window = &bins[start..end];
        let passing = window
            .iter()
            .filter(|&&score| score >= low && score < high)
            .count();
        if passing as f64 >= density * window.len() as f64 {
            out[start..end].copy_from_slice(window);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(bins: &[f64], density: f64, region_size: usize) -> Vec<f64> {
        density_filter_bins(bins, 0.0, 10.0, density, region_size, &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_sparse_window_rejected() {
        // first window: 2/3 in band, second window: 1/3
        let bins = [5.0, 5.0, 20.0, 20.0, 20.0, 5.0];
        assert_eq!(
            run(&bins, 0.5, 3),
            vec![5.0, 5.0, 20.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_truncated_tail_window_uses_own_length() {
        // tail window of one admissible bin must still be admitted
        let bins = [5.0, 5.0, 5.0, 5.0];
        assert_eq!(run(&bins, 1.0, 3), bins.to_vec());
    }
}
