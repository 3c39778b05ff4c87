use serde::{Deserialize, Serialize};

use crate::journal::{JournalEntry, Result};

/// Both sides of a completed void operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidOutcome {
    /// The original entry, now in voided status
    pub original: JournalEntry,
    /// The compensating entry, posted with swapped amounts
    pub reversal: JournalEntry,
}

/// Trait defining the contract for posting lifecycle operations.
pub trait PostingServiceTrait: Send + Sync {
    fn post(&self, entry_id: &str, actor: &str) -> Result<JournalEntry>;
    fn void(&self, entry_id: &str, actor: &str) -> Result<VoidOutcome>;
}
