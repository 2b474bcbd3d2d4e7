//! Scan cursor and its advancement rule.
//!
//! The cursor only moves one height at a time and only onto heights that are
//! at least `finality_depth` behind the remote tip, so the scanner never
//! looks at blocks that can still be reorganized away.

use crate::blockchain::types::Height;
use crate::deposits::types::{ScanError, ScanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    last_processed: Option<Height>,
    finality_depth: u64,
}

impl Cursor {
    pub fn new(last_processed: Option<Height>, finality_depth: u64) -> Self {
        Self {
            last_processed,
            finality_depth,
        }
    }

    pub fn last_processed(&self) -> Option<Height> {
        self.last_processed
    }

    pub fn finality_depth(&self) -> u64 {
        self.finality_depth
    }

    /// Next height to process.
    pub fn next_height(&self) -> Height {
        self.last_processed.map_or(0, |h| h.saturating_add(1))
    }

    /// Highest final height for `tip`, if any.
    pub fn safe_height(&self, tip: Height) -> Option<Height> {
        tip.checked_sub(self.finality_depth)
    }

    /// Fail unless `height` is outside the reorg window for `tip`.
    pub fn ensure_final(&self, height: Height, tip: Height) -> ScanResult<()> {
        match self.safe_height(tip) {
            Some(safe) if height <= safe => Ok(()),
            _ => Err(ScanError::ReorgWindowViolation {
                height,
                tip,
                finality_depth: self.finality_depth,
            }),
        }
    }

    /// Mark `height` as processed.
    pub fn advance(&mut self, height: Height, tip: Height) -> ScanResult<()> {
        let expected = self.next_height();
        if height != expected {
            return Err(ScanError::OutOfOrder {
                expected,
                actual: height,
            });
        }
        self.ensure_final(height, tip)?;
        self.last_processed = Some(height);
        Ok(())
    }
}
