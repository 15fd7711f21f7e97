use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinListError {
    #[error("Bin size must be greater than zero")]
    ZeroBinSize,

    #[error("Expected bins for {expected} chromosomes, found {found}")]
    ChromosomeCountMismatch { expected: usize, found: usize },

    #[error("Chromosome {chromosome}: expected {expected} bins, found {found}")]
    BinCountMismatch {
        chromosome: String,
        expected: usize,
        found: usize,
    },
}
