use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::selected;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

///
/// Smallest and largest non-zero score of the track, optionally over a
/// chromosome subset. A track with no non-zero bin reports the
/// `(0.0, 0.0)` sentinel like the other empty-selection guards.
///
pub struct Extrema<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    selection: Option<&'a [bool]>,
}

impl<'a> Extrema<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        selection: Option<&'a [bool]>,
    ) -> Self {
        Extrema {
            scheduler,
            catalog,
            input,
            selection,
        }
    }
}

impl Operation for Extrema<'_> {
    type Output = (f64, f64);

    fn compute(&self) -> Result<Option<(f64, f64)>, OperationError> {
        if self.selection.is_none() {
            if let (Some(min), Some(max)) = (self.input.stats().min(), self.input.stats().max()) {
                return Ok(Some((min, max)));
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
                let mut extremes: Option<(f64, f64)> = None;
                for &score in bins {
                    token.check()?;
                    if score != 0.0 {
                        extremes = Some(match extremes {
                            None => (score, score),
                            Some((min, max)) => (min.min(score), max.max(score)),
                        });
                    }
                }
                Ok(extremes)
            }));
        }

        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };

        let mut extremes: Option<(f64, f64)> = None;
        for (min, max) in partials.into_iter().flatten() {
            extremes = Some(match extremes {
                None => (min, max),
                Some((current_min, current_max)) => (current_min.min(min), current_max.max(max)),
            });
        }

        match extremes {
            Some((min, max)) => {
                if self.selection.is_none() {
                    self.input.stats().memoize_min(min);
                    self.input.stats().memoize_max(max);
                }
                Ok(Some((min, max)))
            }
            None => Ok(Some((0.0, 0.0))),
        }
    }

    fn description(&self) -> String {
        "Minimum and maximum of non-zero bins".to_string()
    }

    fn processing_label(&self) -> &'static str {
        "Scanning for extremes"
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

    #[test]
    fn test_extrema_ignores_sentinel() {
        let catalog = ChromosomeCatalog::new(vec![
            Chromosome::new("chr1", 300),
            Chromosome::new("chr2", 200),
        ]);
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![-2.0, 0.0, 9.0]), Some(vec![0.0, 4.0])],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(2);
        let op = Extrema::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some((-2.0, 9.0)));
        assert_eq!(input.stats().min(), Some(-2.0));
        assert_eq!(input.stats().max(), Some(9.0));
    }

    #[test]
    fn test_empty_track_reports_sentinel_pair() {
        let catalog = ChromosomeCatalog::new(vec![Chromosome::new("chr1", 100)]);
        let input =
            BinList::from_scores(&catalog, 100, Precision::Bit64, vec![Some(vec![0.0])]).unwrap();
        let scheduler = OperationScheduler::with_threads(1);
        let op = Extrema::new(&scheduler, &catalog, &input, None);
        assert_eq!(op.compute().unwrap(), Some((0.0, 0.0)));
        assert_eq!(input.stats().min(), None);
    }
}
