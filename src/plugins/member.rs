//! Member records: the lifecycle-bearing entity stored in the ledger.
//!
//! A record is created once in the `Carrying` stage, moves through the stages
//! as custody is handed from role to role, and is never removed. Death is a
//! flag on the record, not a deletion.

use crate::core::error::LedgerError;
use crate::core::identity::{Affiliation, Caller};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Two letters, then seven digits from 0 to 8.
static MEMBER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}[0-8]{7}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Carrying,
    Birth,
    Healthy,
    Illness,
    Death,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Carrying => "carrying",
            Stage::Birth => "birth",
            Stage::Healthy => "healthy",
            Stage::Illness => "illness",
            Stage::Death => "death",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: String,
    pub holder: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub weight: Option<i64>,
    pub stage: Stage,
    pub deceased: bool,
}

impl MemberRecord {
    /// Fresh record in the `Carrying` stage, held by its creator.
    pub fn conceived(id: &str, holder: &str) -> Self {
        Self {
            id: id.to_string(),
            holder: holder.to_string(),
            date_of_birth: None,
            gender: None,
            blood_group: None,
            weight: None,
            stage: Stage::Carrying,
            deceased: false,
        }
    }

    /// True once date of birth, gender, blood group and weight are all present.
    pub fn is_fully_defined(&self) -> bool {
        self.missing_details().is_empty()
    }

    pub fn missing_details(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date_of_birth.is_none() {
            missing.push("date_of_birth");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if self.blood_group.is_none() {
            missing.push("blood_group");
        }
        if self.weight.is_none() {
            missing.push("weight");
        }
        missing
    }

    pub fn is_held_by(&self, caller: &Caller) -> bool {
        self.holder == caller.name
    }

    /// Guardians see every record; everyone else only what they hold.
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        self.is_held_by(caller) || caller.is(Affiliation::Guardian)
    }

    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self).map_err(|e| {
            LedgerError::ValidationError(format!("cannot encode member {}: {}", self.id, e))
        })
    }

    /// Error text names the record and the failure position, never the stored bytes.
    pub fn decode(id: &str, bytes: &[u8]) -> Result<Self, LedgerError> {
        serde_json::from_slice(bytes).map_err(|e| {
            LedgerError::CorruptData(format!(
                "member record {} does not decode ({:?} error at line {}, column {})",
                id,
                e.classify(),
                e.line(),
                e.column()
            ))
        })
    }
}

pub fn is_valid_member_id(id: &str) -> bool {
    MEMBER_ID_PATTERN.is_match(id)
}

pub fn validate_member_id(id: &str) -> Result<(), LedgerError> {
    if is_valid_member_id(id) {
        return Ok(());
    }
    Err(LedgerError::ValidationError(format!(
        "invalid member id '{}': expected two letters followed by seven digits 0-8",
        id
    )))
}
