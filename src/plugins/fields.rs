//! Per-field update rules for member details.
//!
//! Details can be changed by the current holder while the member is alive.
//! Date of birth and blood group are reserved to the birth registrar; gender
//! and weight are open to every role except the death registrar. Updates never
//! touch holder, stage or the deceased flag.

use crate::core::error::LedgerError;
use crate::core::identity::{Affiliation, Caller};
use crate::plugins::member::MemberRecord;
use serde::{Deserialize, Serialize};

/// Weight must be submitted as exactly this many characters of integer text.
pub const WEIGHT_TEXT_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberField {
    DateOfBirth,
    Gender,
    BloodGroup,
    Weight,
}

impl MemberField {
    pub fn name(&self) -> &'static str {
        match self {
            MemberField::DateOfBirth => "date_of_birth",
            MemberField::Gender => "gender",
            MemberField::BloodGroup => "blood_group",
            MemberField::Weight => "weight",
        }
    }

    /// Whether `caller`'s role may write this field at all.
    fn role_permits(&self, caller: &Caller) -> bool {
        match self {
            MemberField::DateOfBirth | MemberField::BloodGroup => {
                caller.is(Affiliation::BirthRegistrar)
            }
            MemberField::Gender | MemberField::Weight => !caller.is(Affiliation::DeathRegistrar),
        }
    }
}

pub fn parse_weight(value: &str) -> Result<i64, LedgerError> {
    let invalid = || {
        LedgerError::ValidationError(format!(
            "invalid weight '{}': expected an integer written with exactly {} characters",
            value, WEIGHT_TEXT_LEN
        ))
    };
    if value.len() != WEIGHT_TEXT_LEN {
        return Err(invalid());
    }
    value.parse::<i64>().map_err(|_| invalid())
}

/// Applies one field update, returning the record to persist.
pub fn apply_field_update(
    record: &MemberRecord,
    caller: &Caller,
    field: MemberField,
    value: &str,
) -> Result<MemberRecord, LedgerError> {
    let weight = match field {
        MemberField::Weight => Some(parse_weight(value)?),
        _ => None,
    };

    let mut violations = Vec::new();
    if !record.is_held_by(caller) {
        violations.push(format!("holder {} != caller {}", record.holder, caller.name));
    }
    if !field.role_permits(caller) {
        violations.push(format!("role {} may not set {}", caller.role, field.name()));
    }
    if record.deceased {
        violations.push("member is deceased".to_string());
    }
    if !violations.is_empty() {
        return Err(LedgerError::AuthorizationError(format!(
            "update {} on {}: {}",
            field.name(),
            record.id,
            violations.join("; ")
        )));
    }

    let mut next = record.clone();
    match field {
        MemberField::DateOfBirth => next.date_of_birth = Some(value.to_string()),
        MemberField::Gender => next.gender = Some(value.to_string()),
        MemberField::BloodGroup => next.blood_group = Some(value.to_string()),
        MemberField::Weight => next.weight = weight,
    }
    Ok(next)
}
