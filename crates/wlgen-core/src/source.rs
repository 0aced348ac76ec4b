//! Key sources: where a fresh external key comes from.
//!
//! The rewriter asks its source for a new key every time an INSERT introduces
//! a synthetic key. Two sources exist:
//!
//! - [`IdentityKeys`] (`randint`): the external key is the synthetic key.
//! - [`EmailKeys`] (`email`): the next sampled corpus line, reverse-domain
//!   encoded. Its cursor starts at 0 in each phase and advances by one per
//!   minted key; the corpus index is `cursor * stride + phase offset`.

use crate::encode::reverse_host_name;
use crate::error::{KeymapError, Result};
use crate::sampler::EmailCorpusSampler;
use crate::types::{KeyType, Phase, SyntheticKey};

/// Mints external keys for newly introduced synthetic keys.
pub trait KeySource {
    /// Keyspace this source produces.
    fn key_type(&self) -> KeyType;

    /// Called by the rewriter before each pass.
    fn begin_phase(&mut self, _phase: Phase) {}

    /// Produce the external key for `key`, introduced during `phase`.
    fn mint(&mut self, key: SyntheticKey, phase: Phase) -> Result<String>;
}

/// `randint` mode: external key == synthetic key.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityKeys;

impl KeySource for IdentityKeys {
    fn key_type(&self) -> KeyType {
        KeyType::RandInt
    }

    fn mint(&mut self, key: SyntheticKey, _phase: Phase) -> Result<String> {
        Ok(key.to_string())
    }
}

/// `email` mode: sampled, reverse-domain encoded corpus lines.
#[derive(Clone, Debug)]
pub struct EmailKeys {
    sampler: EmailCorpusSampler,
    cursor: usize,
}

impl EmailKeys {
    /// Wrap a sampler; the cursor starts at 0.
    #[must_use]
    pub const fn new(sampler: EmailCorpusSampler) -> Self {
        Self { sampler, cursor: 0 }
    }

    /// Positions consumed so far in the current phase.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }
}

impl KeySource for EmailKeys {
    fn key_type(&self) -> KeyType {
        KeyType::Email
    }

    fn begin_phase(&mut self, _phase: Phase) {
        self.cursor = 0;
    }

    fn mint(&mut self, _key: SyntheticKey, phase: Phase) -> Result<String> {
        let raw = self.sampler.sample(self.cursor, phase.corpus_offset())?;
        let raw = std::str::from_utf8(raw).map_err(|_| KeymapError::MalformedEmail {
            raw: String::from_utf8_lossy(raw).into_owned(),
            reason: "not UTF-8",
        })?;
        let ext = reverse_host_name(raw)?;
        self.cursor += 1;
        Ok(ext)
    }
}
