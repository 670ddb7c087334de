//! Cache of block templates offered to merged miners
//!
//! Templates are keyed by block hash. One of them is "current": the one
//! handed out until the chain moves or the template ages out. Every
//! template stays submittable until the cache is cleared on a height change.

use std::collections::HashMap;

use crate::core::Block;
use crate::crypto::Hash256;

/// Why a new template has to be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regeneration {
    /// The chain is still at genesis
    Genesis,
    /// The chain height moved since the last generation
    HeightChanged,
    /// The current template is older than the refresh interval
    Expired,
}

#[derive(Debug, Default)]
pub struct AuxBlockCache {
    blocks: HashMap<Hash256, Block>,
    current: Option<Hash256>,
    /// Chain height when the current template was generated
    generated_height: u32,
    /// Unix seconds when the current template was generated
    generated_at: i64,
}

impl AuxBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether the template must be regenerated at `height` and `now`
    pub fn regeneration(&self, height: u32, now: i64, refresh_secs: i64) -> Option<Regeneration> {
        if height == 0 {
            Some(Regeneration::Genesis)
        } else if self.generated_height != height {
            Some(Regeneration::HeightChanged)
        } else if now - self.generated_at > refresh_secs {
            Some(Regeneration::Expired)
        } else {
            None
        }
    }

    /// Whether templates from an earlier height are cached
    pub fn height_changed(&self, height: u32) -> bool {
        self.generated_height != height
    }

    /// Record a successful generation
    pub fn record_generation(&mut self, height: u32, now: i64) {
        self.generated_height = height;
        self.generated_at = now;
    }

    /// Cache a template and make it current
    pub fn insert(&mut self, block: Block) -> Hash256 {
        let hash = block.hash();
        self.blocks.insert(hash, block);
        self.current = Some(hash);
        hash
    }

    /// Drop every template
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.current = None;
    }

    pub fn current(&self) -> Option<&Block> {
        self.current.as_ref().and_then(|hash| self.blocks.get(hash))
    }

    pub fn get(&self, hash: &Hash256) -> Option<&Block> {
        self.blocks.get(hash)
    }

    pub fn get_mut(&mut self, hash: &Hash256) -> Option<&mut Block> {
        self.blocks.get_mut(hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
