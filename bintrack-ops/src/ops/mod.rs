pub mod average;
pub mod correlation;
pub mod density;
pub mod extrema;
pub mod log2;
pub mod moving_average;
pub mod saturation;
pub mod std_dev;
pub mod threshold;
pub mod transfrag;

// re-exports
pub use average::Average;
pub use correlation::Correlation;
pub use density::DensityFilter;
pub use extrema::Extrema;
pub use log2::Log2;
pub use moving_average::MovingAverage;
pub use saturation::Saturation;
pub use std_dev::StandardDeviation;
pub use threshold::ThresholdFilter;
pub use transfrag::{RegionScore, ScoredRegion, Transfrag, TransfragRegions};

use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

/// Whether a chromosome index participates in the operation. A missing
/// mask selects every chromosome; a mask shorter than the catalog leaves
/// the tail unselected.
pub(crate) fn selected(selection: Option<&[bool]>, index: usize) -> bool {
    selection.is_none_or(|mask| mask.get(index).copied().unwrap_or(false))
}

///
/// Run `map` once per populated chromosome and reassemble the outputs
/// into a catalog-aligned frame. Chromosomes without data never get a
/// task and stay absent in the result; `None` propagates an abort.
///
pub(crate) fn map_chromosomes<'a, F>(
    scheduler: &OperationScheduler,
    catalog: &ChromosomeCatalog,
    input: &'a BinList,
    map: F,
) -> Result<Option<Vec<Option<Vec<f64>>>>, OperationError>
where
    F: Fn(&[f64], &CancelToken) -> Result<Vec<f64>, OperationError> + Send + Sync + 'a,
{
    let map = &map;
    let mut indices = Vec::new();
    let mut tasks = Vec::new();
    for index in 0..catalog.len() {
        if let Some(bins) = input.chromosome(index) {
            indices.push(index);
            tasks.push(Task::new(index, move |token: &CancelToken| {
                map(bins, token)
            }));
        }
    }

    let Some(partials) = scheduler.run_all(catalog, tasks)? else {
        return Ok(None);
    };

    let mut rebuilt: Vec<Option<Vec<f64>>> = vec![None; catalog.len()];
    for (index, scores) in indices.into_iter().zip(partials) {
        rebuilt[index] = Some(scores);
    }
    Ok(Some(rebuilt))
}
