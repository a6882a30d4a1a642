/// Square boolean matrix stored as one bitset per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    size: usize,
    words_per_row: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// An all-zero `size` x `size` matrix.
    pub fn new(size: usize) -> Self {
        let words_per_row = size.div_ceil(64);
        Self {
            size,
            words_per_row,
            words: vec![0; size * words_per_row],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(
            row < self.size && col < self.size,
            "index ({row}, {col}) out of bounds for size {}",
            self.size
        );
        let word = self.words[row * self.words_per_row + col / 64];
        word & (1u64 << (col % 64)) != 0
    }

    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(
            row < self.size && col < self.size,
            "index ({row}, {col}) out of bounds for size {}",
            self.size
        );
        self.words[row * self.words_per_row + col / 64] |= 1u64 << (col % 64);
    }

    pub fn row(&self, row: usize) -> &[u64] {
        let start = row * self.words_per_row;
        &self.words[start..start + self.words_per_row]
    }

    pub(crate) fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    /// `row[target] |= row[source]`.
    pub fn or_row_into(&mut self, source: usize, target: usize) {
        if source == target {
            return;
        }
        let w = self.words_per_row;
        for i in 0..w {
            let bits = self.words[source * w + i];
            self.words[target * w + i] |= bits;
        }
    }

    /// Column indices set in a row, ascending.
    pub fn ones_in_row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        let size = self.size;
        self.row(row)
            .iter()
            .enumerate()
            .flat_map(|(i, word)| {
                let word = *word;
                (0..64).filter_map(move |bit| {
                    if word & (1u64 << bit) != 0 {
                        Some(i * 64 + bit)
                    } else {
                        None
                    }
                })
            })
            .filter(move |col| *col < size)
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when every bit set in `other` is also set here.
    pub fn is_superset_of(&self, other: &BitMatrix) -> bool {
        self.size == other.size
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(a, b)| a & b == *b)
    }
}

#[cfg(test)]
mod tests {
    use super::BitMatrix;

    #[test]
    fn test_set_and_get_across_word_boundary() {
        let mut m = BitMatrix::new(130);
        m.set(0, 63);
        m.set(0, 64);
        m.set(129, 129);
        assert!(m.get(0, 63));
        assert!(m.get(0, 64));
        assert!(!m.get(0, 65));
        assert!(m.get(129, 129));
        assert_eq!(m.ones_in_row(0).collect::<Vec<_>>(), vec![63, 64]);
        assert_eq!(m.count_ones(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of bounds")]
    fn test_get_past_last_column_panics() {
        BitMatrix::new(130).get(0, 200);
    }

    #[test]
    fn test_or_row_into() {
        let mut m = BitMatrix::new(3);
        m.set(0, 1);
        m.set(1, 2);
        m.or_row_into(1, 0);
        assert!(m.get(0, 1));
        assert!(m.get(0, 2));
        assert!(!m.get(1, 1));
    }

    #[test]
    fn test_superset() {
        let mut a = BitMatrix::new(2);
        let mut b = BitMatrix::new(2);
        a.set(0, 1);
        a.set(1, 1);
        b.set(0, 1);
        assert!(a.is_superset_of(&b));
        assert!(!b.is_superset_of(&a));
    }
}
