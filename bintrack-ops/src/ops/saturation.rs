use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::OperationScheduler;

///
/// Clamp every non-zero bin into `[low, high]`. Empty bins stay empty:
/// saturation never fabricates signal where the sentinel says there is
/// none.
///
pub struct Saturation<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    low: f64,
    high: f64,
}

impl<'a> Saturation<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        low: f64,
        high: f64,
    ) -> Result<Self, OperationError> {
        if low > high {
            return Err(OperationError::InvalidBounds { low, high });
        }
        Ok(Saturation {
            scheduler,
            catalog,
            input,
            low,
            high,
        })
    }
}

impl Operation for Saturation<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let (low, high) = (self.low, self.high);
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| {
                let mut out = Vec::with_capacity(bins.len());
                for &score in bins {
                    token.check()?;
                    if score == 0.0 {
                        out.push(0.0);
                    } else {
                        out.push(score.clamp(low, high));
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
        format!("Saturation into [{}, {}]", self.low, self.high)
    }

    fn processing_label(&self) -> &'static str {
        "Saturating scores"
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
    fn test_saturation_clamps_non_zero_only() {
        let catalog = ChromosomeCatalog::new(vec![Chromosome::new("chr1", 400)]);
        let input = BinList::from_scores(
            &catalog,
            100,
            Precision::Bit64,
            vec![Some(vec![-5.0, 0.0, 3.0, 50.0])],
        )
        .unwrap();
        let scheduler = OperationScheduler::with_threads(2);
        let op = Saturation::new(&scheduler, &catalog, &input, 1.0, 10.0).unwrap();
        let result = op.compute().unwrap().unwrap();
        assert_eq!(result.chromosome(0), Some(&[1.0, 0.0, 3.0, 10.0][..]));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let catalog = ChromosomeCatalog::new(vec![Chromosome::new("chr1", 100)]);
        let input =
            BinList::from_scores(&catalog, 100, Precision::Bit64, vec![Some(vec![1.0])]).unwrap();
        let scheduler = OperationScheduler::with_threads(1);
        assert!(matches!(
            Saturation::new(&scheduler, &catalog, &input, 10.0, 1.0),
            Err(OperationError::InvalidBounds { .. })
        ));
    }
}
