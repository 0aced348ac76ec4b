//! Fixed-stride sampler over an email corpus.
//!
//! With a corpus of `N` lines and `M` keys to draw, the sampler spaces its
//! picks `stride = N / M` rows apart so the sample spans the whole corpus
//! rather than its first `M` rows. It holds no cursor; callers pass the
//! position they are at (see [`crate::source::EmailKeys`]).
//!
//! Rows are kept as raw bytes. Corpora scraped from the wild carry the odd
//! latin-1 row, and only the rows actually sampled need to be valid UTF-8.

use crate::error::{KeymapError, Result};

/// Corpus plus stride; immutable after construction.
#[derive(Clone, Debug)]
pub struct EmailCorpusSampler {
    corpus: Vec<Vec<u8>>,
    stride: usize,
}

impl EmailCorpusSampler {
    /// Build a sampler drawing `sample_count` keys from `corpus`.
    ///
    /// Fails with [`KeymapError::CorpusSize`] if `sample_count` is zero or
    /// exceeds the corpus length.
    pub fn new<R: Into<Vec<u8>>>(corpus: Vec<R>, sample_count: usize) -> Result<Self> {
        let corpus: Vec<Vec<u8>> = corpus.into_iter().map(Into::into).collect();
        let available = corpus.len();
        if sample_count == 0 || sample_count > available {
            return Err(KeymapError::CorpusSize { requested: sample_count, available });
        }
        Ok(Self { corpus, stride: available / sample_count })
    }

    /// Gap between consecutive picks.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Corpus length `N`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    /// Always `false`: construction rejects an empty corpus.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Corpus index consulted for `position` and `offset`
    /// (`position * stride + offset`), or `None` on arithmetic overflow.
    #[inline]
    #[must_use]
    pub fn index_for(&self, position: usize, offset: usize) -> Option<usize> {
        position.checked_mul(self.stride)?.checked_add(offset)
    }

    /// Raw corpus line at `position * stride + offset`.
    pub fn sample(&self, position: usize, offset: usize) -> Result<&[u8]> {
        debug_assert!(offset <= 1, "phase offsets are 0 or 1");
        let out_of_range = |index| KeymapError::OutOfRange {
            index,
            len: self.corpus.len(),
            position,
            stride: self.stride,
        };
        let index = self.index_for(position, offset).ok_or_else(|| out_of_range(usize::MAX))?;
        self.corpus
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| out_of_range(index))
    }
}
