use crate::core::error::LedgerError;
use crate::core::schemas;
use crate::core::store::LedgerStore;
use serde::{Deserialize, Serialize};

/// Every member id ever created, in creation order. Only ever grows.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl RecordIndex {
    /// Reads the index; a missing key is treated as an empty index.
    pub fn load<L: LedgerStore + ?Sized>(ledger: &L) -> Result<Self, LedgerError> {
        let Some(bytes) = ledger.get_state(schemas::MEMBER_INDEX_KEY)? else {
            return Ok(Self::default());
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::CorruptData(format!("record index {}: {}", schemas::MEMBER_INDEX_KEY, e))
        })
    }

    pub fn store<L: LedgerStore + ?Sized>(&self, ledger: &mut L) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(self).map_err(|e| {
            LedgerError::ValidationError(format!("cannot encode record index: {}", e))
        })?;
        ledger.put_state(schemas::MEMBER_INDEX_KEY, &bytes)
    }

    pub fn append<L: LedgerStore + ?Sized>(ledger: &mut L, id: &str) -> Result<Self, LedgerError> {
        let mut index = Self::load(ledger)?;
        index.ids.push(id.to_string());
        index.store(ledger)?;
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
