use std::fmt::{self, Display};

use bintrack_core::models::{BinList, ChromosomeCatalog};

use crate::errors::OperationError;
use crate::operation::Operation;
use crate::ops::map_chromosomes;
use crate::scheduler::{CancelToken, OperationScheduler, Task};

/// How the bins of one segmented region collapse into its single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionScore {
    Average,
    Sum,
    Maximum,
}

impl Display for RegionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionScore::Average => write!(f, "average"),
            RegionScore::Sum => write!(f, "sum"),
            RegionScore::Maximum => write!(f, "maximum"),
        }
    }
}

/// One segmented feature: `[start_bin, end_bin)` and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRegion {
    pub start_bin: usize,
    pub end_bin: usize,
    pub score: f64,
}

///
/// Island segmentation: contiguous stretches of non-zero bins, tolerating
/// up to `gap` consecutive zero bins inside a stretch, are collapsed into
/// regions. Every bin of a region is stamped with the region's score; a
/// region still open at the end of the chromosome closes at the last
/// index instead of being dropped.
///
pub struct Transfrag<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    gap: usize,
    method: RegionScore,
}

impl<'a> Transfrag<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        gap: usize,
        method: RegionScore,
    ) -> Self {
        Transfrag {
            scheduler,
            catalog,
            input,
            gap,
            method,
        }
    }
}

impl Operation for Transfrag<'_> {
    type Output = BinList;

    fn compute(&self) -> Result<Option<BinList>, OperationError> {
        let (gap, method) = (self.gap, self.method);
        let Some(rebuilt) = map_chromosomes(self.scheduler, self.catalog, self.input, {
            move |bins, token| {
                let mut out = vec![0.0; bins.len()];
                for region in scan_regions(bins, gap, method, token)? {
                    out[region.start_bin..region.end_bin].fill(region.score);
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
        format!(
            "Transfrag segmentation, {} per region, gaps up to {} bins",
            self.method, self.gap
        )
    }

    fn processing_label(&self) -> &'static str {
        "Segmenting into transfrags"
    }

    fn step_count(&self) -> usize {
        1
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

///
/// Same segmentation as [`Transfrag`], but emits the synthetic features
/// themselves instead of stamping a new track: one list of
/// [`ScoredRegion`] per chromosome, absent for chromosomes without data.
///
pub struct TransfragRegions<'a> {
    scheduler: &'a OperationScheduler,
    catalog: &'a ChromosomeCatalog,
    input: &'a BinList,
    gap: usize,
    method: RegionScore,
}

impl<'a> TransfragRegions<'a> {
    pub fn new(
        scheduler: &'a OperationScheduler,
        catalog: &'a ChromosomeCatalog,
        input: &'a BinList,
        gap: usize,
        method: RegionScore,
    ) -> Self {
        TransfragRegions {
            scheduler,
            catalog,
            input,
            gap,
            method,
        }
    }
}

impl Operation for TransfragRegions<'_> {
    type Output = Vec<Option<Vec<ScoredRegion>>>;

    fn compute(&self) -> Result<Option<Self::Output>, OperationError> {
        let (gap, method) = (self.gap, self.method);
        let mut indices = Vec::new();
        let mut tasks = Vec::new();
        for index in 0..self.catalog.len() {
            if let Some(bins) = self.input.chromosome(index) {
                indices.push(index);
                tasks.push(Task::new(index, move |token: &CancelToken| {
                    scan_regions(bins, gap, method, token)
                }));
            }
        }
        let Some(partials) = self.scheduler.run_all(self.catalog, tasks)? else {
            return Ok(None);
        };
        let mut rebuilt: Vec<Option<Vec<ScoredRegion>>> = vec![None; self.catalog.len()];
        for (index, regions) in indices.into_iter().zip(partials) {
            rebuilt[index] = Some(regions);
        }
        Ok(Some(rebuilt))
    }

    fn description(&self) -> String {
        format!(
            "Transfrag features, {} per region, gaps up to {} bins",
            self.method, self.gap
        )
    }

    fn processing_label(&self) -> &'static str {
        "Extracting transfrag features"
    }

    fn step_count(&self) -> usize {
        1
    }

    fn request_stop(&self) {
        self.scheduler.abort();
    }
}

/// Left-to-right scan collecting gap-tolerant non-zero regions. A region
/// spans first to last non-zero bin; the zeros of a tolerated interior
/// gap belong to the region but never contribute to its score.
pub(crate) fn scan_regions(
    bins: &[f64],
    gap: usize,
    method: RegionScore,
    token: &CancelToken,
) -> Result<Vec<ScoredRegion>, OperationError> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_non_zero = 0usize;
    let mut zero_run = 0usize;

    for (position, &score) in bins.iter().enumerate() {
        token.check()?;
        if score != 0.0 {
            if start.is_none() {
                start = Some(position);
            }
            last_non_zero = position;
            zero_run = 0;
        } else if start.is_some() {
            zero_run += 1;
            if zero_run > gap {
                let begin = start.take().unwrap();
                regions.push(close_region(bins, begin, last_non_zero + 1, method));
                zero_run = 0;
            }
        }
    }
    // region still open at the array end closes at the last index
    if let Some(begin) = start {
        regions.push(close_region(bins, begin, last_non_zero + 1, method));
    }
    Ok(regions)
}

fn close_region(bins: &[f64], start_bin: usize, end_bin: usize, method: RegionScore) -> ScoredRegion {
    let values = bins[start_bin..end_bin]
        .iter()
        .copied()
        .filter(|&score| score != 0.0);
    let score = match method {
        RegionScore::Average => {
            let (sum, count) = values.fold((0.0, 0u64), |(s, c), v| (s + v, c + 1));
            // a region holds at least one non-zero bin by construction
            sum / count as f64
        }
        RegionScore::Sum => values.sum(),
        RegionScore::Maximum => values.fold(f64::NEG_INFINITY, f64::max),
    };
    ScoredRegion {
        start_bin,
        end_bin,
        score,
    }
}
