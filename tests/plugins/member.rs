use lifeledger::core::audit::{MemorySink, NullSink};
use lifeledger::core::broker::DbBroker;
use lifeledger::core::db;
use lifeledger::core::error::LedgerError;
use lifeledger::core::identity::{Affiliation, Caller};
use lifeledger::core::schemas;
use lifeledger::core::store::LedgerStore;
use lifeledger::plugins::index::RecordIndex;
use lifeledger::plugins::member::{MemberRecord, Stage};
use lifeledger::plugins::operations::{self, Operation, OperationOutput, Surface};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::{TempDir, tempdir};

const ID: &str = "AB1234567";

struct Ledger {
    _tmp: TempDir,
    db_path: PathBuf,
}

impl Ledger {
    fn new() -> Self {
        let tmp = tempdir().expect("tempdir");
        let db_path = tmp.path().join(schemas::LEDGER_DB_NAME);
        db::initialize_ledger_db(&db_path, &NullSink).expect("init ledger");
        Self { _tmp: tmp, db_path }
    }

    fn call(
        &self,
        surface: Surface,
        caller: &Caller,
        name: &str,
        args: &[&str],
    ) -> Result<OperationOutput, LedgerError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let op = Operation::parse(surface, name, &args)?;
        DbBroker::new(&NullSink).with_ledger(&self.db_path, &caller.name, name, |ledger| {
            operations::execute(&op, ledger, caller, &NullSink)
        })
    }

    fn invoke(
        &self,
        caller: &Caller,
        name: &str,
        args: &[&str],
    ) -> Result<OperationOutput, LedgerError> {
        self.call(Surface::Invoke, caller, name, args)
    }

    fn query(
        &self,
        caller: &Caller,
        name: &str,
        args: &[&str],
    ) -> Result<OperationOutput, LedgerError> {
        self.call(Surface::Query, caller, name, args)
    }

    fn raw(&self, key: &str) -> Option<Vec<u8>> {
        read_raw(&self.db_path, key)
    }
}

fn read_raw(db_path: &Path, key: &str) -> Option<Vec<u8>> {
    DbBroker::new(&NullSink)
        .with_ledger(db_path, "test", "read", |ledger| ledger.get_state(key))
        .expect("raw read")
}

fn member(out: OperationOutput) -> MemberRecord {
    match out {
        OperationOutput::Member(m) => m,
        other => panic!("expected member, got {:?}", other),
    }
}

fn who(name: &str, affiliation: Affiliation) -> Caller {
    Caller::with_affiliation(name, affiliation)
}

#[test]
fn full_lifecycle_from_conception_to_death() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    let bob = who("bob", Affiliation::BirthRegistrar);
    let carol = who("carol", Affiliation::HealthProvider);
    let dana = who("dana", Affiliation::DeathRegistrar);

    let m = member(ledger.invoke(&alice, "create_member", &[ID]).expect("create"));
    assert_eq!(m.stage, Stage::Carrying);
    assert_eq!(m.holder, "alice");

    let m = member(ledger.invoke(&alice, "custody_handoff", &["bob", ID]).expect("handoff"));
    assert_eq!((m.holder.as_str(), m.stage), ("bob", Stage::Birth));

    let err = ledger
        .invoke(&bob, "birth_to_healthy", &["carol", ID])
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationError(_)), "{}", err);
    assert!(err.to_string().contains("not fully defined"));

    ledger.invoke(&bob, "update_dateOfBirth", &["2026-03-14", ID]).expect("dob");
    ledger.invoke(&bob, "update_gender", &["F", ID]).expect("gender");
    ledger.invoke(&bob, "update_bloodGroup", &["O-", ID]).expect("blood group");
    ledger.invoke(&bob, "update_weight", &["000000000003250", ID]).expect("weight");

    let m = member(ledger.invoke(&bob, "birth_to_healthy", &["carol", ID]).expect("birth"));
    assert_eq!((m.holder.as_str(), m.stage), ("carol", Stage::Healthy));
    assert_eq!(m.weight, Some(3250));

    let m = member(ledger.invoke(&carol, "healthy_to_death", &["dana", ID]).expect("death"));
    assert_eq!((m.holder.as_str(), m.stage), ("dana", Stage::Death));
    assert!(!m.deceased);

    let m = member(ledger.invoke(&dana, "dead_member", &[ID]).expect("dead_member"));
    assert!(m.deceased);

    let err = ledger.invoke(&dana, "dead_member", &[ID]).unwrap_err();
    assert!(matches!(err, LedgerError::AuthorizationError(_)));

    let stored = MemberRecord::decode(ID, &ledger.raw(ID).expect("stored")).expect("decode");
    assert_eq!(stored, m);
}

#[test]
fn healthy_to_illness_moves_custody_but_keeps_stage() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    let bob = who("bob", Affiliation::BirthRegistrar);
    let carol = who("carol", Affiliation::HealthProvider);
    let ivan = who("ivan", Affiliation::IllnessProvider);

    ledger.invoke(&alice, "create_member", &[ID]).expect("create");
    ledger.invoke(&alice, "custody_handoff", &["bob", ID]).expect("handoff");
    for (name, value) in [
        ("update_dateOfBirth", "2026-03-14"),
        ("update_gender", "M"),
        ("update_bloodGroup", "A+"),
        ("update_weight", "000000000004100"),
    ] {
        ledger.invoke(&bob, name, &[value, ID]).expect(name);
    }
    ledger.invoke(&bob, "birth_to_healthy", &["carol", ID]).expect("birth");

    let m = member(ledger.invoke(&carol, "healthy_to_illness", &["ivan", ID]).expect("ill"));
    assert_eq!((m.holder.as_str(), m.stage), ("ivan", Stage::Healthy));

    // Stage never reaches Illness through the transition table, so illness hops stay closed.
    let err = ledger
        .invoke(&ivan, "illness_to_illness", &["ivan", ID])
        .unwrap_err();
    assert!(matches!(err, LedgerError::AuthorizationError(_)));
    assert!(err.to_string().contains("stage healthy != illness"));
}

#[test]
fn failed_guard_leaves_record_and_index_bytes_identical() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    ledger.invoke(&alice, "create_member", &[ID]).expect("create");

    let record_before = ledger.raw(ID);
    let index_before = ledger.raw(schemas::MEMBER_INDEX_KEY);

    let mallory = who("mallory", Affiliation::Guardian);
    let bob = who("bob", Affiliation::BirthRegistrar);
    let attempts: [(&Caller, &str, Vec<&str>); 5] = [
        (&mallory, "custody_handoff", vec!["mallory", ID]),
        (&bob, "custody_handoff", vec!["bob", ID]),
        (&alice, "birth_to_healthy", vec!["carol", ID]),
        (&alice, "update_dateOfBirth", vec!["2026-03-14", ID]),
        (&mallory, "create_member", vec![ID]),
    ];
    for (caller, name, args) in attempts {
        assert!(ledger.invoke(caller, name, &args).is_err(), "{} by {}", name, caller.name);
    }

    assert_eq!(ledger.raw(ID), record_before);
    assert_eq!(ledger.raw(schemas::MEMBER_INDEX_KEY), index_before);
}

#[test]
fn is_unique_flips_after_creation() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);

    assert_eq!(
        ledger.query(&alice, "is_unique", &[ID]).expect("before"),
        OperationOutput::Unique { unique: true }
    );
    ledger.invoke(&alice, "create_member", &[ID]).expect("create");
    assert_eq!(
        ledger.query(&alice, "is_unique", &[ID]).expect("after"),
        OperationOutput::Unique { unique: false }
    );
}

#[test]
fn get_members_shows_guardians_everything_and_holders_their_own() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    let bob = who("bob", Affiliation::BirthRegistrar);
    let carol = who("carol", Affiliation::HealthProvider);

    ledger.invoke(&alice, "create_member", &["AB1234567"]).expect("create a");
    ledger.invoke(&alice, "create_member", &["CD7654321"]).expect("create c");
    ledger.invoke(&alice, "custody_handoff", &["bob", "CD7654321"]).expect("handoff");

    let ids = |out: OperationOutput| match out {
        OperationOutput::Members(ms) => ms.into_iter().map(|m| m.id).collect::<Vec<_>>(),
        other => panic!("expected members, got {:?}", other),
    };

    let zoe = who("zoe", Affiliation::Guardian);
    assert_eq!(
        ids(ledger.query(&zoe, "get_members", &[]).expect("guardian list")),
        vec!["AB1234567", "CD7654321"]
    );
    assert_eq!(
        ids(ledger.query(&bob, "get_members", &[]).expect("holder list")),
        vec!["CD7654321"]
    );
    assert!(ids(ledger.query(&carol, "get_members", &[]).expect("stranger list")).is_empty());

    assert!(matches!(
        ledger.query(&carol, "get_member_details", &["CD7654321"]),
        Err(LedgerError::AuthorizationError(_))
    ));
    assert_eq!(
        member(ledger.query(&bob, "get_member_details", &["CD7654321"]).expect("details")).holder,
        "bob"
    );
}

#[test]
fn create_writes_record_and_index_in_one_transaction() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    ledger.invoke(&alice, "create_member", &["AB1234567"]).expect("create");
    ledger.invoke(&alice, "create_member", &["CD7654321"]).expect("create");
    assert!(ledger.invoke(&alice, "create_member", &["AB1234567"]).is_err());

    let index: RecordIndex =
        serde_json::from_slice(&ledger.raw(schemas::MEMBER_INDEX_KEY).expect("index"))
            .expect("index json");
    assert_eq!(index.ids, vec!["AB1234567", "CD7654321"]);
}

#[test]
fn persisted_record_uses_snake_case_and_nulls() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    ledger.invoke(&alice, "create_member", &[ID]).expect("create");

    let json: serde_json::Value =
        serde_json::from_slice(&ledger.raw(ID).expect("stored")).expect("json");
    assert_eq!(
        json,
        serde_json::json!({
            "id": ID,
            "holder": "alice",
            "date_of_birth": null,
            "gender": null,
            "blood_group": null,
            "weight": null,
            "stage": "carrying",
            "deceased": false,
        })
    );
}

#[test]
fn operations_report_outcomes_to_the_sink() {
    let ledger = Ledger::new();
    let sink = MemorySink::new();
    let bob = who("bob", Affiliation::BirthRegistrar);
    let op = Operation::parse(Surface::Invoke, "create_member", &[ID.to_string()]).expect("parse");

    let result = DbBroker::new(&sink).with_ledger(&ledger.db_path, "bob", op.name(), |l| {
        operations::execute(&op, l, &bob, &sink)
    });
    assert!(result.is_err());

    let statuses: Vec<String> = sink.events().into_iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec!["authorization", "rolled_back"]);
}

#[test]
fn concurrent_creators_never_lose_index_entries() {
    let ledger = Ledger::new();
    let db_path = Arc::new(ledger.db_path.clone());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["AB", "CD"]
        .into_iter()
        .map(|prefix| {
            let db_path = Arc::clone(&db_path);
            let gate = Arc::clone(&barrier);
            thread::spawn(move || {
                let alice = who("alice", Affiliation::Guardian);
                gate.wait();
                for n in 0..8 {
                    let id = format!("{}000000{}", prefix, n);
                    let op = Operation::parse(Surface::Invoke, "create_member", &[id])
                        .expect("parse");
                    DbBroker::new(&NullSink)
                        .with_ledger(&db_path, "alice", op.name(), |l| {
                            operations::execute(&op, l, &alice, &NullSink)
                        })
                        .expect("concurrent create");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("creator thread");
    }

    let index: RecordIndex =
        serde_json::from_slice(&ledger.raw(schemas::MEMBER_INDEX_KEY).expect("index"))
            .expect("index json");
    assert_eq!(index.len(), 16);
}

#[test]
fn reserved_keys_never_leak_ids_to_non_guardians() {
    let ledger = Ledger::new();
    let alice = who("alice", Affiliation::Guardian);
    ledger.invoke(&alice, "create_member", &["AB1234567"]).expect("create a");
    ledger.invoke(&alice, "create_member", &["CD1234567"]).expect("create c");

    let eve = Caller::new("eve", "janitor");
    match ledger.query(&eve, "get_members", &[]).expect("list") {
        OperationOutput::Members(ms) => assert!(ms.is_empty()),
        other => panic!("expected members, got {:?}", other),
    }

    for (name, args) in [
        ("get_member_details", vec![schemas::MEMBER_INDEX_KEY]),
        ("is_unique", vec![schemas::MEMBER_INDEX_KEY]),
        ("update_gender", vec!["F", schemas::MEMBER_INDEX_KEY]),
    ] {
        let surface = if name == "update_gender" { Surface::Invoke } else { Surface::Query };
        let err = ledger.call(surface, &eve, name, &args).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)), "{}: {}", name, err);
        let msg = err.to_string();
        assert!(
            !msg.contains("AB1234567") && !msg.contains("CD1234567"),
            "{} leaked ids: {}",
            name,
            msg
        );
    }
}
