/// Inheritance class of a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromosomeClass {
    /// Biparental, diploid.
    Autosome,
    /// X chromosome.
    X,
    /// Y chromosome.
    Y,
    /// Mitochondrial genome.
    Mitochondrial,
}

impl ChromosomeClass {
    /// Classify a contig name, accepting optional `chr` prefixes.
    pub fn of(chromosome: &str) -> Self {
        let name = chromosome
            .strip_prefix("chr")
            .or_else(|| chromosome.strip_prefix("CHR"))
            .unwrap_or(chromosome);
        match name {
            "X" | "x" | "23" => ChromosomeClass::X,
            "Y" | "y" | "24" => ChromosomeClass::Y,
            "M" | "MT" | "m" | "mt" | "26" => ChromosomeClass::Mitochondrial,
            _ => ChromosomeClass::Autosome,
        }
    }
}
