use sha2::{Digest, Sha256};

/// Domain prefix for seed derivation, keeps seeds apart from other sha256 uses.
const SEED_DOMAIN: u8 = 0x02;

/// Deterministic pseudo-random stream for draws and groupings.
///
/// Blocks are `sha256(seed || counter_be)`; words are read big-endian from
/// each block. This is ordinary pseudo-randomness, not a provably fair
/// lottery source: anyone who knows the seed inputs can replay a draw.
#[derive(Clone, Debug)]
pub struct DrawRng {
    seed: [u8; 32],
    counter: u64,
    block: [u8; 32],
    offset: usize,
}

impl DrawRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: 0,
            block: [0u8; 32],
            offset: 32,
        }
    }

    /// Derive a stream from arbitrary inputs.
    ///
    /// `seed = sha256( 0x02 || len_be(part_0) || part_0 || len_be(part_1) || ... )`
    ///
    /// Length prefixes keep `["ab", "c"]` and `["a", "bc"]` distinct.
    pub fn derive(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([SEED_DOMAIN]);
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self::from_seed(hasher.finalize().into())
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }

    fn refill(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(self.counter.to_be_bytes());
        self.block = hasher.finalize().into();
        self.counter += 1;
        self.offset = 0;
    }

    pub fn next_u64(&mut self) -> u64 {
        if self.offset + 8 > self.block.len() {
            self.refill();
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.block[self.offset..self.offset + 8]);
        self.offset += 8;
        u64::from_be_bytes(word)
    }

    /// Uniform integer in `0..bound`. Returns 0 when `bound <= 1`.
    ///
    /// Rejection sampling: words below `2^64 mod bound` are discarded so the
    /// remaining range is an exact multiple of `bound` (no modulo bias).
    pub fn below(&mut self, bound: u64) -> u64 {
        if bound <= 1 {
            return 0;
        }
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let value = self.next_u64();
            if value >= threshold {
                return value % bound;
            }
        }
    }
}

/// Fisher-Yates shuffle. Every permutation is equally likely given a
/// uniform stream, unlike sorting by a random comparator.
pub fn shuffle<T>(items: &mut [T], rng: &mut DrawRng) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i as u64 + 1) as usize;
        items.swap(i, j);
    }
}

/// Pick one element uniformly. `None` for an empty slice.
pub fn pick<'a, T>(items: &'a [T], rng: &mut DrawRng) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.below(items.len() as u64) as usize;
    items.get(index)
}
