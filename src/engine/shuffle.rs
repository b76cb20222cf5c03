// src/engine/shuffle.rs
//
// Seeded, referentially stable option shuffling. The same (items, seed key)
// pair always produces the same order, so re-rendering a question does not
// re-arrange its options, while every (quiz, question index) pair gets its
// own arrangement.

/// FNV-1a over the UTF-8 bytes of the seed key, truncated to 32 bits.
pub fn hash_seed(input: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for b in input.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(16777619);
    }
    h
}

/// Mulberry32 mixer. Small LCG-style generator, good enough for cosmetic
/// shuffling and cheap to seed from a 32-bit hash.
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4294967296.0
    }
}

/// Fisher-Yates permutation of `0..len` driven by `seed_key`.
///
/// The returned vector maps shuffled position to source index. Total over
/// any input: `len == 0` yields an empty permutation.
pub fn permutation(len: usize, seed_key: &str) -> Vec<usize> {
    let mut rng = Mulberry32::new(hash_seed(seed_key));
    let mut order: Vec<usize> = (0..len).collect();

    let mut i = len;
    while i > 1 {
        i -= 1;
        let j = (rng.next_f64() * (i + 1) as f64) as usize;
        order.swap(i, j);
    }

    order
}

/// Shuffles `items`, keeping each element's source index alongside it.
pub fn shuffle<'a, T>(items: &'a [T], seed_key: &str) -> Vec<(usize, &'a T)> {
    permutation(items.len(), seed_key)
        .into_iter()
        .map(|idx| (idx, &items[idx]))
        .collect()
}

/// Position where `source_index` lands after shuffling a list of `len`
/// elements with `seed_key`. `None` when the index is out of range.
pub fn shuffled_position(len: usize, source_index: usize, seed_key: &str) -> Option<usize> {
    if source_index >= len {
        return None;
    }
    permutation(len, seed_key)
        .into_iter()
        .position(|idx| idx == source_index)
}
