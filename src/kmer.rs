//src/kmer.rs

use crate::error::PipelineError;
use crate::matrix::DenseMatrix;

/// The 20 standard amino acids, in column-generation order.
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Number of residues in the alphabet.
pub const ALPHABET_SIZE: usize = AMINO_ACIDS.len();

/// Number of skip-gram columns (every ordered residue pair).
pub const N_FEATURES: usize = ALPHABET_SIZE * ALPHABET_SIZE;

/// Byte -> residue index lookup; `None` for anything outside the alphabet.
#[derive(Debug, Clone)]
pub struct Alphabet {
    index: [Option<u8>; 256],
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new()
    }
}

impl Alphabet {
    pub fn new() -> Self {
        let mut index = [None; 256];
        for (i, &aa) in AMINO_ACIDS.iter().enumerate() {
            index[aa as usize] = Some(i as u8);
        }
        Self { index }
    }

    #[inline]
    pub fn index_of(&self, residue: u8) -> Option<usize> {
        self.index[residue as usize].map(usize::from)
    }

    /// Residue indices of `sequence` with every non-alphabet byte removed.
    /// Positions after a removed byte shift left.
    pub fn clean(&self, sequence: &str) -> Vec<u8> {
        sequence
            .bytes()
            .filter_map(|b| self.index[b as usize])
            .collect()
    }

    /// Column keys (`"AA"`, `"AC"`, ..., `"YY"`): outer loop over the first
    /// residue, inner loop over the second.
    pub fn column_names() -> Vec<String> {
        let mut names = Vec::with_capacity(N_FEATURES);
        for &a1 in AMINO_ACIDS {
            for &a2 in AMINO_ACIDS {
                names.push(format!("{}{}", a1 as char, a2 as char));
            }
        }
        names
    }

    /// Column of the ordered pair `(first, second)` given residue indices.
    #[inline]
    pub fn column_of(first: usize, second: usize) -> usize {
        first * ALPHABET_SIZE + second
    }
}

/// Binary presence/absence table of skip-gram pairs, one row per sequence.
#[derive(Debug, Clone)]
pub struct KmerFeatureTable {
    pub matrix: DenseMatrix,
    pub columns: Vec<String>,
}

impl KmerFeatureTable {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Cell value by column key, e.g. `("AC")`.
    #[cfg(test)]
    pub fn value(&self, row: usize, key: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == key)?;
        Some(self.matrix.get(row, col))
    }
}

/// Skip-gram k-mer encoder: for every window of `k + skip` residues, the pair
/// formed by the window's first residue and the residue at offset `k - 1 + skip`.
#[derive(Debug, Clone)]
pub struct KmerFeatureEncoder {
    k: usize,
    skip: usize,
    alphabet: Alphabet,
}

impl KmerFeatureEncoder {
    pub fn new(k: usize, skip: usize) -> Result<Self, PipelineError> {
        if k == 0 {
            return Err(PipelineError::InvalidParameter(
                "k-mer size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            k,
            skip,
            alphabet: Alphabet::new(),
        })
    }

    pub fn window(&self) -> usize {
        self.k + self.skip
    }

    /// Set the presence bits of one cleaned sequence into `row`.
    fn encode_into(&self, cleaned: &[u8], row: &mut [f64]) {
        let window = self.window();
        if cleaned.len() < window {
            return;
        }
        let offset = self.k - 1 + self.skip;
        for i in 0..=(cleaned.len() - window) {
            let col = Alphabet::column_of(cleaned[i] as usize, cleaned[i + offset] as usize);
            row[col] = 1.0;
        }
    }

    /// Encode `sequences` into a `sequences.len() x 400` table (same row order).
    pub fn encode<S: AsRef<str>>(&self, sequences: &[S]) -> KmerFeatureTable {
        let columns = Alphabet::column_names();
        let mut matrix = DenseMatrix::zeros(sequences.len(), N_FEATURES);
        log::info!("Generated {} skip-gram k-mer attributes", columns.len());

        for (idx, seq) in sequences.iter().enumerate() {
            let cleaned = self.alphabet.clean(seq.as_ref());
            self.encode_into(&cleaned, matrix.row_mut(idx));
        }

        KmerFeatureTable { matrix, columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(seqs: &[&str]) -> KmerFeatureTable {
        KmerFeatureEncoder::new(2, 1).unwrap().encode(seqs)
    }

    fn ones(table: &KmerFeatureTable, row: usize) -> Vec<String> {
        table
            .columns
            .iter()
            .enumerate()
            .filter(|(c, _)| table.matrix.get(row, *c) == 1.0)
            .map(|(_, name)| name.clone())
            .collect()
    }

    #[test]
    fn always_400_columns() {
        assert_eq!(encode(&[]).shape(), (0, 400));
        assert_eq!(encode(&["", "XXXX", "ACDEFGHIKLMNPQRSTVWY"]).shape(), (3, 400));
    }

    #[test]
    fn column_order_is_outer_first_residue() {
        let names = Alphabet::column_names();
        assert_eq!(names[0], "AA");
        assert_eq!(names[1], "AC");
        assert_eq!(names[20], "CA");
        assert_eq!(names[399], "YY");
        assert_eq!(Alphabet::column_of(1, 0), 20);
    }

    #[test]
    fn short_sequence_gives_zero_row() {
        // window is 3; "AC" plus junk cleans to length 2
        let table = encode(&["AC", "A-C*"]);
        assert!(table.matrix.row(0).iter().all(|&v| v == 0.0));
        assert!(table.matrix.row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn pairs_skip_one_residue() {
        // windows: ACD -> AD, CDE -> CE
        let table = encode(&["ACDE"]);
        assert_eq!(ones(&table, 0), vec!["AD".to_string(), "CE".to_string()]);
    }

    #[test]
    fn literal_fragment_sequences() {
        // B is outside the alphabet: ABCDE cleans to ACDE, ABCFED cleans to ACFED
        let table = encode(&["ABCDE", "ABCFED"]);
        assert_eq!(ones(&table, 0), vec!["AD", "CE"]);
        assert_eq!(ones(&table, 1), vec!["AF", "CE", "FD"]);
    }

    #[test]
    fn cleaning_shifts_window_positions() {
        // without cleaning the window would pair A with X; after cleaning A pairs with D
        let table = encode(&["AXCD"]);
        assert_eq!(table.value(0, "AD"), Some(1.0));
        assert_eq!(ones(&table, 0).len(), 1);
    }

    #[test]
    fn repeated_pairs_are_presence_not_count() {
        let table = encode(&["AAAAAAAA", "AAA"]);
        assert_eq!(table.matrix.row(0), table.matrix.row(1));
        assert_eq!(table.value(0, "AA"), Some(1.0));
        assert_eq!(table.matrix.row(0).iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn larger_k_and_skip() {
        // k=3, skip=2: window 5, pair (i, i+4)
        let table = KmerFeatureEncoder::new(3, 2).unwrap().encode(&["ACDEFG"]);
        let mut expected = vec!["AF".to_string(), "CG".to_string()];
        expected.sort();
        let mut got = ones(&table, 0);
        got.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(KmerFeatureEncoder::new(0, 1).is_err());
    }
}
