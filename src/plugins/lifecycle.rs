//! Lifecycle state machine for member records.
//!
//! Custody moves along a fixed pipeline of institutional roles. Every hop is a
//! named transition with one row in [`TRANSITION_TABLE`]: the stage the record
//! must be in, the affiliation the current holder must act under, and the
//! affiliation the receiving party is declared to have. Only the party named as
//! holder can hand the record on, and only to the role its transition names.
//!
//! All functions here are pure: they take a record and return the mutated copy.
//! Persisting it is the repository's job.

use crate::core::error::LedgerError;
use crate::core::identity::{Affiliation, Caller};
use crate::plugins::member::{MemberRecord, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    CustodyHandoff,
    BirthToHealthy,
    HealthyToIllness,
    IllnessToIllness,
    IllnessToHealthy,
    HealthyToDeath,
    IllnessToDeath,
}

/// Guard and effect of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub kind: TransitionKind,
    pub from: Stage,
    pub caller: Affiliation,
    pub recipient: Affiliation,
    /// `None` keeps the current stage.
    pub next_stage: Option<Stage>,
    pub requires_details: bool,
}

/// Ordered like [`TransitionKind::ALL`].
pub const TRANSITION_TABLE: [TransitionRule; 7] = [
    TransitionRule {
        kind: TransitionKind::CustodyHandoff,
        from: Stage::Carrying,
        caller: Affiliation::Guardian,
        recipient: Affiliation::BirthRegistrar,
        next_stage: Some(Stage::Birth),
        requires_details: false,
    },
    TransitionRule {
        kind: TransitionKind::BirthToHealthy,
        from: Stage::Birth,
        caller: Affiliation::BirthRegistrar,
        recipient: Affiliation::HealthProvider,
        next_stage: Some(Stage::Healthy),
        requires_details: true,
    },
    TransitionRule {
        kind: TransitionKind::HealthyToIllness,
        from: Stage::Healthy,
        caller: Affiliation::HealthProvider,
        recipient: Affiliation::IllnessProvider,
        next_stage: None,
        requires_details: false,
    },
    TransitionRule {
        kind: TransitionKind::IllnessToIllness,
        from: Stage::Illness,
        caller: Affiliation::IllnessProvider,
        recipient: Affiliation::IllnessProvider,
        next_stage: None,
        requires_details: false,
    },
    // Caller and recipient roles read inverted relative to the name; kept as recorded.
    TransitionRule {
        kind: TransitionKind::IllnessToHealthy,
        from: Stage::Illness,
        caller: Affiliation::HealthProvider,
        recipient: Affiliation::IllnessProvider,
        next_stage: None,
        requires_details: false,
    },
    TransitionRule {
        kind: TransitionKind::HealthyToDeath,
        from: Stage::Healthy,
        caller: Affiliation::HealthProvider,
        recipient: Affiliation::DeathRegistrar,
        next_stage: Some(Stage::Death),
        requires_details: false,
    },
    TransitionRule {
        kind: TransitionKind::IllnessToDeath,
        from: Stage::Illness,
        caller: Affiliation::IllnessProvider,
        recipient: Affiliation::DeathRegistrar,
        next_stage: Some(Stage::Death),
        requires_details: false,
    },
];

impl TransitionKind {
    pub const ALL: [TransitionKind; 7] = [
        TransitionKind::CustodyHandoff,
        TransitionKind::BirthToHealthy,
        TransitionKind::HealthyToIllness,
        TransitionKind::IllnessToIllness,
        TransitionKind::IllnessToHealthy,
        TransitionKind::HealthyToDeath,
        TransitionKind::IllnessToDeath,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TransitionKind::CustodyHandoff => "custody_handoff",
            TransitionKind::BirthToHealthy => "birth_to_healthy",
            TransitionKind::HealthyToIllness => "healthy_to_illness",
            TransitionKind::IllnessToIllness => "illness_to_illness",
            TransitionKind::IllnessToHealthy => "illness_to_healthy",
            TransitionKind::HealthyToDeath => "healthy_to_death",
            TransitionKind::IllnessToDeath => "illness_to_death",
        }
    }

    pub fn rule(&self) -> &'static TransitionRule {
        &TRANSITION_TABLE[*self as usize]
    }

    /// Affiliation the invocation surface asserts for the receiving party.
    pub fn declared_recipient(&self) -> Affiliation {
        self.rule().recipient
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Party a record is being handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub affiliation: Affiliation,
}

impl Recipient {
    pub fn new(name: &str, affiliation: Affiliation) -> Self {
        Self {
            name: name.to_string(),
            affiliation,
        }
    }
}

impl TransitionRule {
    /// Every guard this rule fails for the given record, caller and recipient.
    pub fn violations(
        &self,
        record: &MemberRecord,
        caller: &Caller,
        recipient: &Recipient,
    ) -> Vec<String> {
        let mut out = Vec::new();
        if record.stage != self.from {
            out.push(format!("stage {} != {}", record.stage, self.from));
        }
        if !record.is_held_by(caller) {
            out.push(format!("holder {} != caller {}", record.holder, caller.name));
        }
        if !caller.is(self.caller) {
            out.push(format!("caller role {} != {}", caller.role, self.caller));
        }
        if recipient.affiliation != self.recipient {
            out.push(format!(
                "recipient role {} != {}",
                recipient.affiliation, self.recipient
            ));
        }
        if record.deceased {
            out.push("member is deceased".to_string());
        }
        out
    }
}

/// Evaluates `kind` against `record` and returns the record as it should be persisted.
pub fn apply_transition(
    record: &MemberRecord,
    caller: &Caller,
    kind: TransitionKind,
    recipient: &Recipient,
) -> Result<MemberRecord, LedgerError> {
    let rule = kind.rule();

    if rule.requires_details && !record.is_fully_defined() {
        // Which details are missing is only reported to the holder.
        let missing = if record.is_held_by(caller) {
            format!(" (missing {})", record.missing_details().join(", "))
        } else {
            String::new()
        };
        return Err(LedgerError::ValidationError(format!(
            "{}: member {} not fully defined{}",
            kind, record.id, missing
        )));
    }

    let violations = rule.violations(record, caller, recipient);
    if !violations.is_empty() {
        return Err(LedgerError::AuthorizationError(format!(
            "{} on {}: {}",
            kind,
            record.id,
            violations.join("; ")
        )));
    }

    if recipient.name.trim().is_empty() {
        return Err(LedgerError::ValidationError(format!(
            "{}: recipient name cannot be empty",
            kind
        )));
    }

    let mut next = record.clone();
    next.holder = recipient.name.clone();
    if let Some(stage) = rule.next_stage {
        next.stage = stage;
    }
    Ok(next)
}

/// Records the death of a member already in the `Death` stage.
///
/// Succeeds once per record; afterwards the `deceased` guard fails.
pub fn mark_deceased(record: &MemberRecord, caller: &Caller) -> Result<MemberRecord, LedgerError> {
    let mut violations = Vec::new();
    if record.stage != Stage::Death {
        violations.push(format!("stage {} != {}", record.stage, Stage::Death));
    }
    if !record.is_held_by(caller) {
        violations.push(format!("holder {} != caller {}", record.holder, caller.name));
    }
    if !caller.is(Affiliation::DeathRegistrar) {
        violations.push(format!(
            "caller role {} != {}",
            caller.role,
            Affiliation::DeathRegistrar
        ));
    }
    if record.deceased {
        violations.push("member is already deceased".to_string());
    }
    if !violations.is_empty() {
        return Err(LedgerError::AuthorizationError(format!(
            "dead_member on {}: {}",
            record.id,
            violations.join("; ")
        )));
    }

    let mut next = record.clone();
    next.deceased = true;
    Ok(next)
}
