use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::average::Average;
use crate::ops::selected;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

///
/// Population standard deviation of the non-zero bins: `√(Σ(x−mean)² /
/// count)`. Two scheduler rounds: the mean first (a full [`Average`]
/// run), then the squared deviations. Returns 0 when no selected
/// chromosome has a non-zero bin.
///
pub struct StandardDeviation<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    selection: Option<&'a [bool]>,
}

impl<'a> StandardDeviation<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        selection: Option<&'a [bool]>,
    ) -> Self {
        StandardDeviation {
            scheduler,
            catalog,
            input,
            selection,
        }
    }
}

impl Operation for StandardDeviation<'_> {
    type Output = f64;

    fn compute(&self) -> Result<Option<f64>, OperationError> {
        if self.selection.is_none() {
            if let Some(cached) = self.input.stats().std_dev() {
                return Ok(Some(cached));
            }
        }

        let mean_op = Average::new(self.scheduler, self.catalog, self.input, self.selection);
        let Some(mean) = mean_op.compute()? else {
            return Ok(None);
        };

        let mut tasks = Vec::new();
        for index in 0..self.catalog.len() {
            if !selected(self.selection, index) {
                continue;
            }
            let Some(bins) = self.input.chromosome(index) else {
                continue;
            };
            tasks.push(Task::new(index, move |token: &CancelToken| {
                let mut squared = 0.0;
                let mut count = 0u64;
                for &score in bins {
                    token.check()?;
                    if score != 0.0 {
                        squared += (score - mean) * (score - mean);
                        count += 1;
                    }
                }
                Ok((squared, count))
            }));
        }

        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };

        let total_squared: f64 = partials.iter().map(|partial| partial.0).sum();
        let total_count: u64 = partials.iter().map(|partial| partial.1).sum();
        let std_dev = if total_count == 0 {
            0.0
        } else {
            (total_squared / total_count as f64).sqrt()
        };

        if self.selection.is_none() {
            self.input.stats().memoize_std_dev(std_dev);
        }
        Ok(Some(std_dev))
    }

    fn description(&self) -> String {
        format!(
            "Standard deviation of non-zero bins (bin size {})",
            self.input.bin_size()
        )
    }

    fn processing_label(&self) -> &'static str {
        "Computing standard deviation"
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

    #[test]
    fn test_std_dev_over_non_zero_bins() {
        let catalog = ChromosomeCatalog::new(vec![
            Chromosome::new("chr1", 200),
            Chromosome::new("chr2", 200),
        ]);
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![1.0, 0.0]), Some(vec![0.0, 3.0])],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(2);
        // mean 2, deviations 1 and 1, population form
        let op = StandardDeviation::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some(1.0));
        assert_eq!(input.stats().std_dev(), Some(1.0));
    }

    #[test]
    fn test_std_dev_of_empty_track_is_zero() {
        let catalog = ChromosomeCatalog::new(vec![Chromosome::new("chr1", 200)]);
        let input =
            BinList::from_scores(&catalog, 100, Precision::Bit64, vec![Some(vec![0.0, 0.0])])
                .unwrap();
        let scheduler = OperationScheduler::with_threads(1);
        let op = StandardDeviation::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some(0.0));
    }
}
