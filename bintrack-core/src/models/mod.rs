pub mod bin_list;
pub mod chromosome;
pub mod precision;

// re-export for cleaner imports
pub use self::bin_list::BinList;
pub use self::bin_list::StatsCache;
pub use self::chromosome::Chromosome;
pub use self::chromosome::ChromosomeCatalog;
pub use self::precision::Precision;
