use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///
/// Chromosome struct, one named sequence of a genome assembly
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chromosome {
    pub name: String,
    pub length: u32,
}

impl Chromosome {
    pub fn new<S: Into<String>>(name: S, length: u32) -> Self {
        Chromosome {
            name: name.into(),
            length,
        }
    }

    ///
    /// Number of bins needed to tile this chromosome at `bin_size`
    ///
    pub fn bin_count(&self, bin_size: u32) -> usize {
        self.length.div_ceil(bin_size) as usize
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.length)
    }
}

///
/// Ordered chromosome list of one genome assembly. The position of a
/// chromosome in the list is its stable index: every bin list and every
/// operation addresses chromosomes through this same index space.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChromosomeCatalog {
    chromosomes: Vec<Chromosome>,
}

impl ChromosomeCatalog {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        ChromosomeCatalog { chromosomes }
    }

    pub fn get(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes.get(index)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chromosome> {
        self.chromosomes.iter()
    }

    ///
    /// Summed length of all chromosomes in base pairs. Used to weight
    /// progress reporting, so that long chromosomes count for more than
    /// short ones.
    ///
    pub fn total_length(&self) -> u64 {
        self.chromosomes.iter().map(|c| u64::from(c.length)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn catalog() -> ChromosomeCatalog {
        ChromosomeCatalog::new(vec![
            Chromosome::new("chr1", 1000),
            Chromosome::new("chr2", 3000),
        ])
    }

    #[rstest]
    #[case(100, 11)]
    #[case(1050, 1)]
    #[case(2000, 1)]
    fn test_bin_count_rounds_up(#[case] bin_size: u32, #[case] expected: usize) {
        let chr = Chromosome::new("chr1", 1050);
        assert_eq!(chr.bin_count(bin_size), expected);
    }

    #[rstest]
    fn test_total_length(catalog: ChromosomeCatalog) {
        assert_eq!(catalog.total_length(), 4000);
    }

    #[rstest]
    fn test_stable_indexing(catalog: ChromosomeCatalog) {
        assert_eq!(catalog.get(0).unwrap().name, "chr1");
        assert_eq!(catalog.get(1).unwrap().name, "chr2");
        assert!(catalog.get(2).is_none());
    }
}
