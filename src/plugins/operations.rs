//! Named operations and their dispatch.
//!
//! Callers address the ledger by operation name plus a positional argument
//! list. Names resolve through [`OPERATION_TABLE`] to a closed
//! [`OperationKind`]; [`Operation::parse`] checks the surface and arity and
//! pulls out the target id; [`execute`] runs it against a ledger.
//!
//! Argument layout: transitions and field updates take `(value, id)`, with the
//! id last. `create_member`, `dead_member` and the id-taking queries take
//! `(id)`. `get_members` and `ping` take nothing.

use crate::core::audit::{AuditEvent, EventSink, Level};
use crate::core::error::LedgerError;
use crate::core::identity::Caller;
use crate::core::store::LedgerStore;
use crate::plugins::fields::{MemberField, apply_field_update};
use crate::plugins::lifecycle::{Recipient, TransitionKind, apply_transition, mark_deceased};
use crate::plugins::member::MemberRecord;
use crate::plugins::repository::RecordRepository;
use serde::Serialize;

pub const PING_REPLY: &str = "Hello, world!";

/// Which entry point an operation may be called through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Invoke,
    Query,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Invoke => "invoke",
            Surface::Query => "query",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Ping,
    CreateMember,
    Transition(TransitionKind),
    UpdateField(MemberField),
    DeadMember,
    GetMemberDetails,
    GetMembers,
    IsUnique,
}

const INVOKE: &[Surface] = &[Surface::Invoke];
const QUERY: &[Surface] = &[Surface::Query];

/// Name, kind, and the surfaces each operation is reachable from.
pub const OPERATION_TABLE: &[(&str, OperationKind, &[Surface])] = &[
    ("ping", OperationKind::Ping, &[Surface::Invoke, Surface::Query]),
    ("create_member", OperationKind::CreateMember, INVOKE),
    ("custody_handoff", OperationKind::Transition(TransitionKind::CustodyHandoff), INVOKE),
    ("birth_to_healthy", OperationKind::Transition(TransitionKind::BirthToHealthy), INVOKE),
    ("healthy_to_illness", OperationKind::Transition(TransitionKind::HealthyToIllness), INVOKE),
    ("illness_to_illness", OperationKind::Transition(TransitionKind::IllnessToIllness), INVOKE),
    ("illness_to_healthy", OperationKind::Transition(TransitionKind::IllnessToHealthy), INVOKE),
    ("healthy_to_death", OperationKind::Transition(TransitionKind::HealthyToDeath), INVOKE),
    ("illness_to_death", OperationKind::Transition(TransitionKind::IllnessToDeath), INVOKE),
    ("update_dateOfBirth", OperationKind::UpdateField(MemberField::DateOfBirth), INVOKE),
    ("update_gender", OperationKind::UpdateField(MemberField::Gender), INVOKE),
    ("update_bloodGroup", OperationKind::UpdateField(MemberField::BloodGroup), INVOKE),
    ("update_weight", OperationKind::UpdateField(MemberField::Weight), INVOKE),
    ("dead_member", OperationKind::DeadMember, INVOKE),
    ("get_member_details", OperationKind::GetMemberDetails, QUERY),
    ("get_members", OperationKind::GetMembers, QUERY),
    ("is_unique", OperationKind::IsUnique, QUERY),
];

impl OperationKind {
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATION_TABLE
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, kind, _)| *kind)
    }

    pub fn name(&self) -> &'static str {
        OPERATION_TABLE
            .iter()
            .find(|(_, kind, _)| kind == self)
            .map(|(n, _, _)| *n)
            .unwrap_or("unknown")
    }

    pub fn surfaces(&self) -> &'static [Surface] {
        OPERATION_TABLE
            .iter()
            .find(|(_, kind, _)| kind == self)
            .map(|(_, _, s)| *s)
            .unwrap_or(&[])
    }

    pub fn arity(&self) -> usize {
        match self {
            OperationKind::Ping | OperationKind::GetMembers => 0,
            OperationKind::CreateMember
            | OperationKind::DeadMember
            | OperationKind::GetMemberDetails
            | OperationKind::IsUnique => 1,
            OperationKind::Transition(_) | OperationKind::UpdateField(_) => 2,
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            OperationKind::Ping
                | OperationKind::GetMemberDetails
                | OperationKind::GetMembers
                | OperationKind::IsUnique
        )
    }
}

/// A fully parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    /// Member id the operation targets, if any.
    pub id: Option<String>,
    /// Recipient name for transitions, new value for field updates.
    pub value: Option<String>,
}

impl Operation {
    pub fn parse(surface: Surface, name: &str, args: &[String]) -> Result<Self, LedgerError> {
        let kind = OperationKind::from_name(name).ok_or_else(|| {
            LedgerError::ValidationError(format!("function {} doesn't exist", name))
        })?;
        if !kind.surfaces().contains(&surface) {
            return Err(LedgerError::ValidationError(format!(
                "function {} is not available via {}",
                name,
                surface.as_str()
            )));
        }
        if args.len() != kind.arity() {
            return Err(LedgerError::ValidationError(format!(
                "{} expects {} argument(s), got {}",
                name,
                kind.arity(),
                args.len()
            )));
        }

        let (value, id) = match kind.arity() {
            0 => (None, None),
            1 => (None, Some(args[0].clone())),
            _ => (Some(args[0].clone()), Some(args[1].clone())),
        };
        Ok(Self { kind, id, value })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn id(&self) -> Result<&str, LedgerError> {
        self.id.as_deref().ok_or_else(|| {
            LedgerError::ValidationError(format!("{} requires a member id", self.name()))
        })
    }

    fn value(&self) -> Result<&str, LedgerError> {
        self.value.as_deref().ok_or_else(|| {
            LedgerError::ValidationError(format!("{} requires a value", self.name()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Pong(String),
    Member(MemberRecord),
    Members(Vec<MemberRecord>),
    Unique { unique: bool },
}

/// Runs one operation against `ledger` on behalf of `caller`.
///
/// The outcome is reported to `sink` either way. On error nothing should be
/// committed; that is up to whoever owns the ledger transaction.
pub fn execute<L: LedgerStore + ?Sized>(
    op: &Operation,
    ledger: &mut L,
    caller: &Caller,
    sink: &dyn EventSink,
) -> Result<OperationOutput, LedgerError> {
    let result = dispatch(op, ledger, caller, sink);

    let mut event = match &result {
        Ok(_) => {
            let level = if op.kind.is_mutating() { Level::Info } else { Level::Debug };
            AuditEvent::new(level, &caller.name, op.name(), "success")
        }
        Err(e) => AuditEvent::new(Level::Warn, &caller.name, op.name(), e.kind())
            .with_detail(e.to_string()),
    };
    if let Some(id) = &op.id {
        event = event.with_target(id);
    }
    sink.emit(event);

    result
}

fn dispatch<L: LedgerStore + ?Sized>(
    op: &Operation,
    ledger: &mut L,
    caller: &Caller,
    sink: &dyn EventSink,
) -> Result<OperationOutput, LedgerError> {
    let mut repo = RecordRepository::new(ledger, sink);
    match op.kind {
        OperationKind::Ping => Ok(OperationOutput::Pong(PING_REPLY.to_string())),
        OperationKind::CreateMember => repo.create(op.id()?, caller).map(OperationOutput::Member),
        OperationKind::Transition(kind) => {
            let record = repo.load(op.id()?)?;
            let recipient = Recipient::new(op.value()?, kind.declared_recipient());
            let next = apply_transition(&record, caller, kind, &recipient)?;
            repo.save(&next)?;
            Ok(OperationOutput::Member(next))
        }
        OperationKind::UpdateField(field) => {
            let record = repo.load(op.id()?)?;
            let next = apply_field_update(&record, caller, field, op.value()?)?;
            repo.save(&next)?;
            Ok(OperationOutput::Member(next))
        }
        OperationKind::DeadMember => {
            let record = repo.load(op.id()?)?;
            let next = mark_deceased(&record, caller)?;
            repo.save(&next)?;
            Ok(OperationOutput::Member(next))
        }
        OperationKind::GetMemberDetails => repo
            .details(op.id()?, caller)
            .map(OperationOutput::Member),
        OperationKind::GetMembers => repo.list_all(caller).map(OperationOutput::Members),
        OperationKind::IsUnique => repo
            .is_unique(op.id()?)
            .map(|unique| OperationOutput::Unique { unique }),
    }
}
