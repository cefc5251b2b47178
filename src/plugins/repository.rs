//! Load, guard, mutate and persist member records for one invocation.
//!
//! The repository works against whatever [`LedgerStore`] the invocation was
//! given. It never commits anything itself: every write it issues lands or is
//! discarded together with the rest of the invocation.

use crate::core::audit::{AuditEvent, EventSink, Level};
use crate::core::error::LedgerError;
use crate::core::identity::{Affiliation, Caller};
use crate::core::store::LedgerStore;
use crate::plugins::index::RecordIndex;
use crate::plugins::member::{MemberRecord, validate_member_id};

pub struct RecordRepository<'a, L: LedgerStore + ?Sized> {
    ledger: &'a mut L,
    sink: &'a dyn EventSink,
}

impl<'a, L: LedgerStore + ?Sized> RecordRepository<'a, L> {
    pub fn new(ledger: &'a mut L, sink: &'a dyn EventSink) -> Self {
        Self { ledger, sink }
    }

    /// Creates a record held by its creator and appends it to the index.
    pub fn create(&mut self, id: &str, caller: &Caller) -> Result<MemberRecord, LedgerError> {
        validate_member_id(id)?;
        if self.ledger.get_state(id)?.is_some() {
            return Err(LedgerError::ValidationError(format!(
                "member {} already exists",
                id
            )));
        }
        if !caller.is(Affiliation::Guardian) {
            return Err(LedgerError::AuthorizationError(format!(
                "create_member: caller role {} != {}",
                caller.role,
                Affiliation::Guardian
            )));
        }

        let record = MemberRecord::conceived(id, &caller.name);
        self.save(&record)?;
        RecordIndex::append(&mut *self.ledger, id)?;
        Ok(record)
    }

    /// Only well-formed member ids reach the ledger, so reserved keys stay unreadable.
    pub fn load(&self, id: &str) -> Result<MemberRecord, LedgerError> {
        validate_member_id(id)?;
        let bytes = self
            .ledger
            .get_state(id)?
            .ok_or_else(|| LedgerError::NotFound(format!("member {}", id)))?;
        MemberRecord::decode(id, &bytes)
    }

    pub fn save(&mut self, record: &MemberRecord) -> Result<(), LedgerError> {
        let bytes = record.encode()?;
        self.ledger.put_state(&record.id, &bytes)
    }

    /// The full record, if the caller holds it or is a guardian.
    pub fn details(&self, id: &str, caller: &Caller) -> Result<MemberRecord, LedgerError> {
        let record = self.load(id)?;
        if !record.is_visible_to(caller) {
            return Err(LedgerError::AuthorizationError(format!(
                "get_member_details on {}: caller {} is neither holder nor {}",
                id,
                caller.name,
                Affiliation::Guardian
            )));
        }
        Ok(record)
    }

    /// Every indexed record visible to the caller, in creation order.
    ///
    /// Entries that cannot be loaded are skipped and reported to the sink.
    pub fn list_all(&self, caller: &Caller) -> Result<Vec<MemberRecord>, LedgerError> {
        let index = RecordIndex::load(&*self.ledger)?;
        let mut out = Vec::new();
        for id in &index.ids {
            match self.load(id) {
                Ok(record) if record.is_visible_to(caller) => out.push(record),
                Ok(_) => {}
                Err(e) => self.sink.emit(
                    AuditEvent::new(Level::Warn, &caller.name, "get_members", "skipped")
                        .with_target(id)
                        .with_detail(e.to_string()),
                ),
            }
        }
        Ok(out)
    }

    /// `Ok(true)` when nothing is stored under `id`, `Ok(false)` when a record is.
    ///
    /// Any other load failure is returned as-is; callers treat it as "not unique".
    pub fn is_unique(&self, id: &str) -> Result<bool, LedgerError> {
        match self.load(id) {
            Ok(_) => Ok(false),
            Err(LedgerError::NotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }
}
