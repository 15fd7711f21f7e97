use log::debug;

use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::selected;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

///
/// Genome-wide average of the non-zero bins, optionally restricted to a
/// chromosome subset. The full, unrestricted average is memoized on the
/// input list; a repeated request returns the cached value without
/// scheduling any task.
///
pub struct Average<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    selection: Option<&'a [bool]>,
}

impl<'a> Average<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        selection: Option<&'a [bool]>,
    ) -> Self {
        Average {
            scheduler,
            catalog,
            input,
            selection,
        }
    }
}

impl Operation for Average<'_> {
    type Output = f64;

    fn compute(&self) -> Result<Option<f64>, OperationError> {
        if self.selection.is_none() {
            if let Some(cached) = self.input.stats().average() {
                debug!("Returning memoized genome-wide average");
                return Ok(Some(cached));
            }
        }

        let mut tasks = Vec::new();
        for index in 0..self.catalog.len() {
            if !selected(self.selection, index) {
                continue;
            }
            let Some(bins) = self.input.chromosome(index) else {
                continue;
            };
            tasks.push(Task::new(index, move |token: &CancelToken| {
                let mut sum = 0.0;
                let mut count = 0u64;
                for &score in bins {
                    token.check()?;
                    if score != 0.0 {
                        sum += score;
                        count += 1;
                    }
                }
                Ok((sum, count))
            }));
        }

        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };

        let total_sum: f64 = partials.iter().map(|partial| partial.0).sum();
        let total_count: u64 = partials.iter().map(|partial| partial.1).sum();
        let average = if total_count == 0 {
            0.0
        } else {
            total_sum / total_count as f64
        };

        if self.selection.is_none() {
            let stats = self.input.stats();
            stats.memoize_sum(total_sum);
            stats.memoize_non_zero_bins(total_count);
            stats.memoize_average(average);
        }
        Ok(Some(average))
    }

    fn description(&self) -> String {
        format!(
            "Average of non-zero bins (bin size {})",
            self.input.bin_size()
        )
    }

    fn processing_label(&self) -> &'static str {
        "Computing average"
    }

    fn step_count(&self) -> usize {
        1
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
        ChromosomeCatalog::new(vec![
            Chromosome::new("chr1", 300),
            Chromosome::new("chr2", 300),
        ])
    }

    fn track(catalog: &ChromosomeCatalog) -> BinList {
        BinList::from_scores(
            catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![1.0, 0.0, 3.0]), Some(vec![0.0, 8.0, 0.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_average_skips_zero_bins() {
        let catalog = catalog();
        let input = track(&catalog);
        let scheduler = OperationScheduler::with_threads(2);
        let op = Average::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some(4.0));
    }

    #[test]
    fn test_average_of_empty_track_is_zero() {
        let catalog = catalog();
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![0.0, 0.0, 0.0]), None],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(2);
        let op = Average::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some(0.0));
    }

    #[test]
    fn test_selection_bypasses_cache() {
        let catalog = catalog();
        let input = track(&catalog);
        let scheduler = OperationScheduler::with_threads(2);

        let full = Average::new(&scheduler, &catalog, &input, None);
        assert_eq!(full.compute().unwrap(), Some(4.0));
        assert_eq!(input.stats().average(), Some(4.0));

        // a masked request must recompute instead of reading the cache
        let mask = vec![false, true];
        let partial = Average::new(&scheduler, &catalog, &input, Some(&mask));
        assert_eq!(partial.compute().unwrap(), Some(8.0));

        let mask = vec![true, false];
        let partial = Average::new(&scheduler, &catalog, &input, Some(&mask));
        assert_eq!(partial.compute().unwrap(), Some(2.0));
    }
}
