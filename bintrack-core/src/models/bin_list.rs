use std::sync::OnceLock;

use crate::errors::BinListError;
use crate::models::chromosome::ChromosomeCatalog;
use crate::models::precision::Precision;

///
/// Whole-genome aggregates memoized on a bin list. Each field is written
/// at most once, by an operation that ran over the full chromosome set;
/// operations restricted to a chromosome subset must bypass this cache.
///
#[derive(Debug, Default)]
pub struct StatsCache {
    sum: OnceLock<f64>,
    average: OnceLock<f64>,
    std_dev: OnceLock<f64>,
    min: OnceLock<f64>,
    max: OnceLock<f64>,
    non_zero_bins: OnceLock<u64>,
}

impl StatsCache {
    pub fn sum(&self) -> Option<f64> {
        self.sum.get().copied()
    }

    pub fn average(&self) -> Option<f64> {
        self.average.get().copied()
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.std_dev.get().copied()
    }

    pub fn min(&self) -> Option<f64> {
        self.min.get().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.max.get().copied()
    }

    pub fn non_zero_bins(&self) -> Option<u64> {
        self.non_zero_bins.get().copied()
    }

    pub fn memoize_sum(&self, value: f64) {
        let _ = self.sum.set(value);
    }

    pub fn memoize_average(&self, value: f64) {
        let _ = self.average.set(value);
    }

    pub fn memoize_std_dev(&self, value: f64) {
        let _ = self.std_dev.set(value);
    }

    pub fn memoize_min(&self, value: f64) {
        let _ = self.min.set(value);
    }

    pub fn memoize_max(&self, value: f64) {
        let _ = self.max.set(value);
    }

    pub fn memoize_non_zero_bins(&self, value: u64) {
        let _ = self.non_zero_bins.set(value);
    }
}

///
/// One genome-wide track of fixed-width score bins, partitioned by
/// chromosome. Chromosomes without any data carry `None` instead of an
/// empty vector; populated chromosomes hold exactly
/// `ceil(chromosome length / bin size)` scores.
///
/// A score of exactly 0.0 means "no signal at this bin" and is excluded
/// from every statistic computed over the list. Instances are immutable:
/// every transform produces a new list.
///
#[derive(Debug)]
pub struct BinList {
    bin_size: u32,
    precision: Precision,
    chromosome_bins: Vec<Option<Vec<f64>>>,
    stats: StatsCache,
}

impl BinList {
    ///
    /// Build a list from raw per-chromosome scores, validating that the
    /// scores line up with the catalog and rounding them to `precision`.
    ///
    pub fn from_scores(
        catalog: &ChromosomeCatalog,
        bin_size: u32,
        precision: Precision,
        mut chromosome_bins: Vec<Option<Vec<f64>>>,
    ) -> Result<Self, BinListError> {
        if bin_size == 0 {
            return Err(BinListError::ZeroBinSize);
        }
        if chromosome_bins.len() != catalog.len() {
            return Err(BinListError::ChromosomeCountMismatch {
                expected: catalog.len(),
                found: chromosome_bins.len(),
            });
        }
        for (index, bins) in chromosome_bins.iter_mut().enumerate() {
            let Some(bins) = bins else { continue };
            // catalog index is in range, checked just above
            let chromosome = catalog.get(index).unwrap();
            let expected = chromosome.bin_count(bin_size);
            if bins.len() != expected {
                return Err(BinListError::BinCountMismatch {
                    chromosome: chromosome.name.clone(),
                    expected,
                    found: bins.len(),
                });
            }
            for score in bins.iter_mut() {
                *score = precision.quantize(*score);
            }
        }
        Ok(BinList {
            bin_size,
            precision,
            chromosome_bins,
            stats: StatsCache::default(),
        })
    }

    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn chromosome_count(&self) -> usize {
        self.chromosome_bins.len()
    }

    /// Scores of one chromosome, `None` when it has no data.
    pub fn chromosome(&self, index: usize) -> Option<&[f64]> {
        self.chromosome_bins
            .get(index)
            .and_then(|bins| bins.as_deref())
    }

    pub fn has_data(&self, index: usize) -> bool {
        self.chromosome(index).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&[f64]>> {
        self.chromosome_bins.iter().map(|bins| bins.as_deref())
    }

    pub fn stats(&self) -> &StatsCache {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chromosome::Chromosome;
    use pretty_assertions::assert_eq;

    fn catalog() -> ChromosomeCatalog {
        ChromosomeCatalog::new(vec![
            Chromosome::new("chr1", 300),
            Chromosome::new("chr2", 250),
        ])
    }

    #[test]
    fn test_from_scores_checks_bin_counts() {
        let result = BinList::from_scores(
            &catalog(),
            100,
            Precision::Bit64,
            vec![Some(vec![1.0, 2.0, 3.0]), Some(vec![1.0, 2.0])],
        );
        assert!(result.is_err());

        let list = BinList::from_scores(
            &catalog(),
            100,
            Precision::Bit64,
            vec![Some(vec![1.0, 2.0, 3.0]), Some(vec![1.0, 2.0, 3.0])],
        )
        .unwrap();
        assert_eq!(list.chromosome(0), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_from_scores_rejects_zero_bin_size() {
        let result = BinList::from_scores(&catalog(), 0, Precision::Bit64, vec![None, None]);
        assert!(matches!(result, Err(BinListError::ZeroBinSize)));
    }

    #[test]
    fn test_missing_chromosomes_stay_absent() {
        let list = BinList::from_scores(
            &catalog(),
            100,
            Precision::Bit64,
            vec![None, Some(vec![0.0, 4.0, 0.0])],
        )
        .unwrap();
        assert!(!list.has_data(0));
        assert!(list.has_data(1));
        assert!(list.chromosome(5).is_none());
    }

    #[test]
    fn test_quantization_applied_on_build() {
        let value = 0.1f64 + 0.2f64;
        let list = BinList::from_scores(
            &ChromosomeCatalog::new(vec![Chromosome::new("chr1", 100)]),
            100,
            Precision::Bit32,
            vec![Some(vec![value])],
        )
        .unwrap();
        assert_eq!(list.chromosome(0).unwrap()[0], value as f32 as f64);
    }

    #[test]
    fn test_stats_cache_writes_once() {
        let cache = StatsCache::default();
        assert_eq!(cache.average(), None);
        cache.memoize_average(4.5);
        cache.memoize_average(9.9);
        assert_eq!(cache.average(), Some(4.5));
    }
}
