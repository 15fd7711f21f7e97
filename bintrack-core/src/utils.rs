use std::io::BufRead;
use std::io::BufReader;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::chromosome::{Chromosome, ChromosomeCatalog};

///
/// Read a two-column chrom.sizes file (e.g. `chr1\t248956422`) into an
/// ordered catalog. Line order in the file defines the chromosome index
/// space, so the same file must be used for every aligned track.
///
/// # Arguments
///
/// - path: path to the chrom.sizes file
///
pub fn read_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<ChromosomeCatalog> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open chrom sizes file: {:?}", path.as_ref()))?;
    let reader = BufReader::new(file);

    let mut chromosomes = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let name = fields
            .next()
            .with_context(|| format!("Missing chromosome name on line {}", number + 1))?;
        let length = fields
            .next()
            .with_context(|| format!("Missing chromosome length on line {}", number + 1))?
            .parse::<u32>()
            .with_context(|| format!("Failed to parse chromosome length on line {}", number + 1))?;
        chromosomes.push(Chromosome::new(name, length));
    }

    if chromosomes.is_empty() {
        anyhow::bail!("No chromosomes found in {:?}", path.as_ref());
    }

    Ok(ChromosomeCatalog::new(chromosomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_chrom_sizes_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.chrom.sizes");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "chr2\t3000").unwrap();
        writeln!(file, "chr1\t1000").unwrap();
        drop(file);

        let catalog = read_chrom_sizes(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name, "chr2");
        assert_eq!(catalog.get(1).unwrap().length, 1000);
        assert_eq!(catalog.total_length(), 4000);
    }

    #[test]
    fn test_read_chrom_sizes_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.chrom.sizes");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "chr1\tnot_a_number").unwrap();
        drop(file);

        assert!(read_chrom_sizes(&path).is_err());
    }
}
