use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::OperationScheduler;

///
/// Log₂ transform of every non-zero bin. A negative score has no
/// logarithm: the task fails with a computation error, the remaining
/// chromosomes are cancelled and the error surfaces to the caller.
///
pub struct Log2<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
}

impl<'a> Log2<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
    ) -> Self {
        Log2 {
            scheduler,
            catalog,
            input,
        }
    }
}

impl Operation for Log2<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| {
                let mut out = Vec::with_capacity(bins.len());
                for &score in bins {
                    token.check()?;
                    if score == 0.0 {
                        out.push(0.0);
                    } else if score < 0.0 {
                        return Err(OperationError::Computation(format!(
                            "Logarithm of negative score {}",
                            score
                        )));
                    } else {
                        out.push(score.log2());
                    }
                }
                Ok(out)
            }
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
        "Log2 of non-zero bins".to_string()
    }

    fn processing_label(&self) -> &'static str {
        "Applying log2"
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
        ChromosomeCatalog::new(vec![Chromosome::new("chr1", 300)])
    }

    #[test]
    fn test_log2_keeps_sentinel_bins() {
        let catalog = catalog();
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![8.0, 0.0, 1.0])],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(1);
        let op = Log2::new(&scheduler, &catalog, &input);
        let result = op.compute().unwrap().unwrap();
        // log2(1) collapses into the sentinel, a known artifact of the
        // zero-as-missing convention
        assert_eq!(result.chromosome(0), Some(&[3.0, 0.0, 0.0][..]));
    }

    #[test]
    fn test_log2_of_negative_score_fails() {
        let catalog = catalog();
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![8.0, -1.0, 1.0])],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(1);
        let op = Log2::new(&scheduler, &catalog, &input);
        assert!(matches!(
            op.compute(),
            Err(OperationError::Computation(_))
        ));
    }
}
