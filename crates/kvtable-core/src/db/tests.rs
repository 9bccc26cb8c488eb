use crate::{
    config::TableConfig,
    db::{Index, Table},
    error::{ConflictKind, ErrorClass, ErrorDetail, ErrorOrigin},
    host::{KvHost, MemoryHost},
    key::Key,
    name::Name,
    obs::{MetricsEvent, MetricsSink, PutKind, with_metrics_sink},
    serialize::{Record, RecordEnvelope},
    test_support::*,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

fn names(rows: &[User]) -> Vec<&str> {
    rows.iter().map(|user| user.name.as_str()).collect()
}

//
// put / get
//

#[test]
fn primary_and_secondary_lookups_resolve_the_same_record() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();
    table.put(&user(2, "b")).unwrap();

    let by_id = table.index(BY_ID).unwrap();
    let by_name = table.index(BY_NAME).unwrap();

    assert_eq!(by_id.find(&1).unwrap().value().unwrap().name, "a");
    assert_eq!(by_name.find("b").unwrap().value().unwrap().id, 2);
    assert_eq!(by_id.get(&2).unwrap(), Some(user(2, "b")));
    assert_eq!(by_name.get("a").unwrap(), Some(user(1, "a")));
    assert_eq!(names(&by_id.range(&1, &3).unwrap()), ["a", "b"]);
}

#[test]
fn repeated_put_is_idempotent() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    let record = user(7, "grace");

    table.put(&record).unwrap();
    let before = host.entries(users_namespace());
    table.put(&record).unwrap();

    assert_eq!(host.entries(users_namespace()), before);
    assert_eq!(table.index(BY_ID).unwrap().get(&7).unwrap(), Some(record));
}

#[test]
fn changing_a_secondary_field_moves_the_secondary_entry() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();
    table.put(&user(1, "z")).unwrap();

    let by_name = table.index(BY_NAME).unwrap();
    assert!(by_name.find("a").unwrap().is_end());
    assert_eq!(by_name.find("z").unwrap().value().unwrap().id, 1);

    // one primary entry plus one secondary entry
    assert_eq!(host.len(users_namespace()), 2);
}

#[test]
fn duplicate_secondary_on_insert_aborts_and_leaves_store_untouched() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();
    let before = host.entries(users_namespace());

    let err = table.put(&user(2, "a")).unwrap_err();

    assert_eq!(err.class, ErrorClass::Conflict);
    assert!(err.message.contains("attempted to store an existing secondary index"));
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Conflict {
            kind: ConflictKind::DuplicateSecondary,
            ..
        })
    ));
    assert_eq!(host.entries(users_namespace()), before);
    assert_eq!(table.index(BY_ID).unwrap().get(&2).unwrap(), None);
}

#[test]
fn update_onto_another_records_secondary_aborts() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();
    table.put(&user(2, "b")).unwrap();
    let before = host.entries(users_namespace());

    let err = table.put(&user(2, "a")).unwrap_err();

    assert!(err.is_conflict());
    assert!(err.message.contains("attempted to update an existing secondary index"));
    assert_eq!(host.entries(users_namespace()), before);
    assert_eq!(
        table.index(BY_NAME).unwrap().get("b").unwrap(),
        Some(user(2, "b"))
    );
}

#[test]
fn conflict_on_a_later_index_discards_earlier_index_writes() {
    let host = MemoryHost::new();
    let table = Table::builder(users_config())
        .primary(BY_ID)
        .secondary(BY_AGE)
        .secondary(BY_NAME)
        .build(&host)
        .unwrap();
    table.put(&user(1, "a")).unwrap();
    let before = host.entries(users_namespace());

    let mut other = user(2, "a");
    other.age = 99;

    assert!(table.put(&other).unwrap_err().is_conflict());
    assert_eq!(host.entries(users_namespace()), before);
    assert_eq!(table.index(BY_AGE).unwrap().get(&(99, 2)).unwrap(), None);
}

//
// erase
//

#[test]
fn erase_is_idempotent() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    let record = user(1, "a");
    table.put(&record).unwrap();

    table.erase(&record).unwrap();
    table.erase(&record).unwrap();

    assert!(host.is_empty(users_namespace()));
}

#[test]
fn erase_uses_the_stored_record_for_secondary_keys() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();

    // stale copy with a different secondary field
    table.erase(&user(1, "stale")).unwrap();

    assert!(host.is_empty(users_namespace()));
    assert!(!table.index(BY_NAME).unwrap().exists("a").unwrap());
}

#[test]
fn erased_secondary_key_can_be_reused() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();
    table.erase(&user(1, "a")).unwrap();

    table.put(&user(2, "a")).unwrap();

    assert_eq!(table.index(BY_NAME).unwrap().at("a").unwrap().id, 2);
}

//
// lookups
//

#[test]
fn exists_and_get_report_absence_without_error() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();

    let by_id = table.index(BY_ID).unwrap();
    assert!(by_id.exists(&1).unwrap());
    assert!(!by_id.exists(&2).unwrap());
    assert_eq!(by_id.get(&2).unwrap(), None);
    assert!(by_id.find(&2).unwrap().is_end());
    assert!(by_id.find(&2).unwrap() == by_id.end());
}

#[test]
fn at_names_the_call_site_on_missing_keys() {
    let host = MemoryHost::new();
    let table = users_table(&host);

    let err = table.index(BY_NAME).unwrap().at("nobody").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.origin, ErrorOrigin::Index);
    assert!(err.message.starts_with(file!()), "{}", err.message);
    assert!(err.message.contains("byname"));
}

#[test]
fn bounds_and_ranges_follow_key_order() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    for (id, name) in [(10, "j"), (20, "t"), (30, "d"), (40, "m")] {
        table.put(&user(id, name)).unwrap();
    }

    let by_id = table.index(BY_ID).unwrap();
    assert_eq!(by_id.lower_bound(&20).unwrap().value().unwrap().id, 20);
    assert_eq!(by_id.lower_bound(&21).unwrap().value().unwrap().id, 30);
    assert_eq!(by_id.upper_bound(&20).unwrap().value().unwrap().id, 30);
    assert!(by_id.upper_bound(&40).unwrap().is_end());

    assert_eq!(names(&by_id.range(&15, &40).unwrap()), ["t", "d"]);
    assert!(by_id.range(&20, &20).unwrap().is_empty());
    assert!(by_id.range(&40, &10).unwrap().is_empty());

    let by_name = table.index(BY_NAME).unwrap();
    assert_eq!(names(&by_name.range("d", "n").unwrap()), ["d", "j", "m"]);
}

#[test]
fn composite_keys_order_by_each_field_in_turn() {
    let host = MemoryHost::new();
    let table = users_table_with_age(&host);
    for (id, name, age) in [(1, "a", 30), (2, "b", 25), (3, "c", 30), (4, "d", 40)] {
        let mut record = user(id, name);
        record.age = age;
        table.put(&record).unwrap();
    }

    let by_age = table.index(BY_AGE).unwrap();
    let rows: Vec<_> = by_age.iter().map(Result::unwrap).collect();
    assert_eq!(names(&rows), ["b", "a", "c", "d"]);

    let thirty = by_age.range(&(30, 0), &(31, 0)).unwrap();
    assert_eq!(names(&thirty), ["a", "c"]);
}

#[test]
fn untyped_views_take_pre_encoded_keys() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(5, "e")).unwrap();

    let primary = table.primary();
    assert!(primary.is_primary());
    assert_eq!(primary.name(), BY_ID.name());
    assert_eq!(primary.get(&Key::encode(&5u64).unwrap()).unwrap(), Some(user(5, "e")));

    let by_name = table.index_named(BY_NAME.name()).unwrap();
    assert!(!by_name.is_primary());
    assert!(by_name.exists(&Key::encode("e").unwrap()).unwrap());
}

//
// isolation
//

#[test]
fn tables_and_indices_occupy_disjoint_prefixes() {
    let host = MemoryHost::new();
    let users = users_table(&host);
    let admins_config = TableConfig::new(CONTRACT, Name::new_const("admins"));
    let admins: Table<User, _> = Table::builder(admins_config)
        .primary(BY_ID)
        .secondary(BY_NAME)
        .build(&host)
        .unwrap();

    users.put(&user(1, "a")).unwrap();
    users.put(&user(2, "b")).unwrap();
    admins.put(&user(1, "root")).unwrap();

    let user_rows: Vec<_> = users.index(BY_ID).unwrap().iter().map(Result::unwrap).collect();
    let admin_rows: Vec<_> = admins.index(BY_NAME).unwrap().iter().map(Result::unwrap).collect();

    assert_eq!(names(&user_rows), ["a", "b"]);
    assert_eq!(names(&admin_rows), ["root"]);
    assert_ne!(
        users.index(BY_ID).unwrap().prefix(),
        users.index(BY_NAME).unwrap().prefix()
    );
}

#[test]
fn databases_are_isolated_namespaces() {
    let host = MemoryHost::new();
    let ram = users_table(&host);
    let disk: Table<User, _> = Table::builder(users_config().with_db(crate::name::KV_DISK))
        .primary(BY_ID)
        .build(&host)
        .unwrap();

    ram.put(&user(1, "a")).unwrap();

    assert_eq!(disk.index(BY_ID).unwrap().get(&1).unwrap(), None);
    assert!(disk.index(BY_ID).unwrap().begin().is_end());
}

//
// setup and misuse
//

#[test]
fn builder_rejects_bad_index_sets() {
    let host = MemoryHost::new();

    let missing = Table::<User, _>::builder(users_config())
        .secondary(BY_NAME)
        .build(&host)
        .unwrap_err();
    assert_eq!(missing.class, ErrorClass::Config);

    let twice = Table::builder(users_config())
        .primary(BY_ID)
        .secondary(BY_ID)
        .build(&host)
        .unwrap_err();
    assert!(twice.message.contains("twice"));

    let two_primaries = Table::builder(users_config())
        .primary(BY_ID)
        .primary(BY_NAME)
        .build(&host)
        .unwrap_err();
    assert!(two_primaries.message.contains("more than one primary"));

    let bad_config = Table::builder(TableConfig::new(Name::EMPTY, USERS))
        .primary(BY_ID)
        .build(&host)
        .unwrap_err();
    assert_eq!(bad_config.origin, ErrorOrigin::Config);
}

#[test]
fn index_names_list_primary_first() {
    let host = MemoryHost::new();
    let table = users_table_with_age(&host);

    let names: Vec<String> = table.index_names().map(|name| name.to_string()).collect();
    assert_eq!(names, ["byid", "byname", "byage"]);
}

#[test]
fn kv_index_builds_definitions_outside_const_items() {
    let by_age = kv_index!(User, age);
    let by_alias = kv_index!(User, alias => name);

    assert_eq!(by_age.name(), Name::new_const("age"));
    assert_eq!(by_alias.name().to_string(), "alias");
    assert_eq!(by_alias.key_of(&user(1, "ann")), "ann");
}

#[test]
fn typed_view_checks_registration_and_key_type() {
    let host = MemoryHost::new();
    let table = users_table(&host);

    let unknown = table.index(BY_AGE).unwrap_err();
    assert_eq!(unknown.class, ErrorClass::Misuse);
    assert!(unknown.message.contains("not registered"));

    let wrong_key: Index<User, u32> = Index::new(BY_NAME.name(), |user| user.age);
    let mismatch = table.index(wrong_key).unwrap_err();
    assert_eq!(mismatch.class, ErrorClass::Misuse);
    assert!(mismatch.message.contains("not keyed by"));
}

#[test]
fn oversized_records_are_rejected_before_writing() {
    let host = MemoryHost::new();
    let table = Table::builder(users_config().with_max_value_bytes(16))
        .primary(BY_ID)
        .build(&host)
        .unwrap();

    let err = table.put(&user(1, &"x".repeat(64))).unwrap_err();

    assert_eq!(err.class, ErrorClass::Config);
    assert!(host.is_empty(users_namespace()));
}

#[test]
fn foreign_discriminant_is_a_deserialization_error() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    table.put(&user(1, "a")).unwrap();

    let by_id = table.index(BY_ID).unwrap();
    let storage_key = by_id.prefix() + &Key::encode(&1u64).unwrap();
    let mut bytes = host
        .entries(users_namespace())
        .into_iter()
        .find(|(key, _)| *key == storage_key)
        .map(|(_, value)| value)
        .unwrap();
    bytes[0] = 1;
    host.kv_set(users_namespace(), &storage_key, &bytes);

    let err = by_id.get(&1).unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Serialize);
    assert!(err.message.contains("found 1"));
}

//
// self-tagged records
//

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
enum Shape {
    Circle { id: u64, radius: u32 },
    Square { id: u64, side: u32 },
}

impl Record for Shape {
    const ENVELOPE: RecordEnvelope = RecordEnvelope::SelfTagged;
}

const SHAPE_ID: Index<Shape, u64> = Index::new(Name::new_const("id"), |shape| match shape {
    Shape::Circle { id, .. } | Shape::Square { id, .. } => *id,
});

#[test]
fn self_tagged_records_round_trip() {
    let host = MemoryHost::new();
    let table = Table::builder(TableConfig::new(CONTRACT, Name::new_const("shapes")))
        .primary(SHAPE_ID)
        .build(&host)
        .unwrap();

    let circle = Shape::Circle { id: 1, radius: 3 };
    let square = Shape::Square { id: 2, side: 4 };
    table.put(&circle).unwrap();
    table.put(&square).unwrap();

    let view = table.index(SHAPE_ID).unwrap();
    assert_eq!(view.get(&1).unwrap(), Some(circle));
    assert_eq!(view.get(&2).unwrap(), Some(square));
}

//
// metrics
//

#[derive(Default)]
struct CapturingSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CapturingSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[test]
fn writes_report_put_kind_and_index_deltas() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    let sink = CapturingSink::default();

    with_metrics_sink(&sink, || {
        table.put(&user(1, "a")).unwrap();
        table.put(&user(1, "b")).unwrap();
        let _ = table.put(&user(2, "b"));
        table.erase(&user(9, "none")).unwrap();
    });

    let events = sink.events.into_inner();
    assert_eq!(
        events,
        [
            MetricsEvent::IndexDelta {
                table: USERS,
                inserts: 1,
                removes: 0,
            },
            MetricsEvent::Put {
                table: USERS,
                kind: PutKind::Insert,
            },
            MetricsEvent::IndexDelta {
                table: USERS,
                inserts: 1,
                removes: 1,
            },
            MetricsEvent::Put {
                table: USERS,
                kind: PutKind::Update,
            },
            MetricsEvent::SecondaryConflict { table: USERS },
            MetricsEvent::Erase {
                table: USERS,
                found: false,
            },
        ]
    );
}

#[test]
fn no_iterator_outlives_its_operation() {
    let host = MemoryHost::new();
    let table = users_table(&host);
    for id in 0..5 {
        table.put(&user(id, &format!("u{id}"))).unwrap();
    }

    let by_name = table.index(BY_NAME).unwrap();
    let _ = by_name.range("u1", "u4").unwrap();
    let _ = by_name.find("u2").unwrap().value().unwrap();
    let _ = by_name.upper_bound("u3").unwrap();
    let _: Vec<_> = by_name.iter().collect();

    assert_eq!(host.live_iterators(), 0);
}
