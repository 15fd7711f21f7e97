use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::selected;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

/// Partial sums of one chromosome's co-occurring bins. `None` when the
/// chromosome has no position where both inputs are non-zero.
type CoSums = Option<(f64, f64, u64)>;

///
/// Pearson correlation between two tracks of equal bin size, over the
/// bins where BOTH inputs are non-zero. Two sequential scheduler rounds:
/// the genome-wide means of the co-occurring values first, then the
/// squared deviations and cross products, reduced single-threaded after
/// the join. Each task returns its own partial tuple, so no shared
/// accumulators and no in-task locking.
///
/// A pair of tracks with no co-occurring bins correlates at 0, which is
/// a defined result rather than an error.
///
pub struct Correlation<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    first: &'a BinList,
    second: &'a BinList,
    selection: Option<&'a [bool]>,
}

impl<'a> Correlation<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        first: &'a BinList,
        second: &'a BinList,
        selection: Option<&'a [bool]>,
    ) -> Result<Self, OperationError> {
        if first.bin_size() != second.bin_size() {
            return Err(OperationError::MismatchedBinSize(
                first.bin_size(),
                second.bin_size(),
            ));
        }
        if first.chromosome_count() != second.chromosome_count() {
            return Err(OperationError::MismatchedChromosomeCount(
                first.chromosome_count(),
                second.chromosome_count(),
            ));
        }
        Ok(Correlation {
            scheduler,
            catalog,
            first,
            second,
            selection,
        })
    }

    /// Chromosome indices where both inputs carry data and the selection
    /// admits them.
    fn participating(&self) -> Vec<usize> {
        (0..self.catalog.len())
            .filter(|&index| {
                selected(self.selection, index)
                    && self.first.has_data(index)
                    && self.second.has_data(index)
            })
            .collect()
    }
}

impl Operation for Correlation<'_> {
    type Output = f64;

    fn compute(&self) -> Result<Option<f64>, OperationError> {
        let participating = self.participating();

        // round 1: genome-wide means of the co-occurring values
        let mut tasks = Vec::new();
        for &index in &participating {
            let bins1 = self.first.chromosome(index).unwrap();
            let bins2 = self.second.chromosome(index).unwrap();
            tasks.push(Task::new(index, move |token: &CancelToken| {
                let mut sum1 = 0.0;
                let mut sum2 = 0.0;
                let mut count = 0u64;
                for (&x, &y) in bins1.iter().zip(bins2) {
                    token.check()?;
                    if x != 0.0 && y != 0.0 {
                        sum1 += x;
                        sum2 += y;
                        count += 1;
                    }
                }
                let partial: CoSums = if count == 0 {
                    None
                } else {
                    Some((sum1, sum2, count))
                };
                Ok(partial)
            }));
        }
        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };

        let mut sum1 = 0.0;
        let mut sum2 = 0.0;
        let mut count = 0u64;
        for (s1, s2, n) in partials.into_iter().flatten() {
            sum1 += s1;
            sum2 += s2;
            count += n;
        }
        if count == 0 {
            return Ok(Some(0.0));
        }
        let mean1 = sum1 / count as f64;
        let mean2 = sum2 / count as f64;

        // round 2: deviations and cross products against those means
        let mut tasks = Vec::new();
        for &index in &participating {
            let bins1 = self.first.chromosome(index).unwrap();
            let bins2 = self.second.chromosome(index).unwrap();
            tasks.push(Task::new(index, move |token: &CancelToken| {
                let mut dev1 = 0.0;
                let mut dev2 = 0.0;
                let mut product = 0.0;
                for (&x, &y) in bins1.iter().zip(bins2) {
                    token.check()?;
                    if x != 0.0 && y != 0.0 {
                        dev1 += (x - mean1) * (x - mean1);
                        dev2 += (y - mean2) * (y - mean2);
                        product += x * y;
                    }
                }
                Ok((dev1, dev2, product))
            }));
        }
        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };

        let squared1: f64 = partials.iter().map(|partial| partial.0).sum();
        let squared2: f64 = partials.iter().map(|partial| partial.1).sum();
        let products: f64 = partials.iter().map(|partial| partial.2).sum();

        let n = count as f64;
        if count < 2 {
            return Ok(Some(0.0));
        }
        let stdev1 = (squared1 / (n - 1.0)).sqrt();
        let stdev2 = (squared2 / (n - 1.0)).sqrt();
        let denominator = (n - 1.0) * stdev1 * stdev2;
        if denominator == 0.0 {
            return Ok(Some(0.0));
        }
        Ok(Some((products - n * mean1 * mean2) / denominator))
    }

    fn description(&self) -> String {
        format!(
            "Correlation of co-occurring non-zero bins (bin size {})",
            self.first.bin_size()
        )
    }

    fn processing_label(&self) -> &'static str {
        "Computing correlation"
    }

    fn step_count(&self) -> usize {
        2
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bintrack_core::models::{Chromosome, Precision};
    use pretty_assertions::assert_eq;

    fn catalog() -> ChromosomeCatalog {
        ChromosomeCatalog::new(vec![Chromosome::new("chr1", 300)])
    }

    fn track(catalog: &ChromosomeCatalog, scores: Vec<f64>) -> BinList {
        BinList::from_scores(catalog, 100, Precision::Bit64, vec![Some(scores)]).unwrap()
    }

    #[test]
    fn test_identical_tracks_correlate_at_one() {
        let catalog = catalog();
        let a = track(&catalog, vec![1.0, 2.0, 3.0]);
        let b = track(&catalog, vec![1.0, 2.0, 3.0]);
        let scheduler = OperationScheduler::with_threads(2);
        let op = Correlation::new(&scheduler, &catalog, &a, &b, None).unwrap();
        let r = op.compute().unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12, "r = {}", r);
    }

    #[test]
    fn test_mismatched_bin_sizes_rejected() {
        let catalog = catalog();
        let a = track(&catalog, vec![1.0, 2.0, 3.0]);
        let b = BinList::from_scores(&catalog, 300, Precision::Bit64, vec![Some(vec![1.0])])
            .unwrap();
        let scheduler = OperationScheduler::with_threads(2);
        let result = Correlation::new(&scheduler, &catalog, &a, &b, None);
        assert!(matches!(
            result,
            Err(OperationError::MismatchedBinSize(100, 300))
        ));
    }

    #[test]
    fn test_no_co_occurrence_is_zero() {
        let catalog = catalog();
        // non-zero bins never line up
        let a = track(&catalog, vec![1.0, 0.0, 3.0]);
        let b = track(&catalog, vec![0.0, 2.0, 0.0]);
        let scheduler = OperationScheduler::with_threads(2);
        let op = Correlation::new(&scheduler, &catalog, &a, &b, None).unwrap();
        assert_eq!(op.compute().unwrap(), Some(0.0));
    }
}
