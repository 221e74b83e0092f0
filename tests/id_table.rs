use std::collections::BTreeSet;

use idtable::{Id, IdTable, IdTableConfig, IdTableError};

fn table(limit: Id) -> IdTable<Id> {
    IdTable::with_config(IdTableConfig::default().with_limit(limit)).expect("config")
}

fn alloc(table: &mut IdTable<Id>) -> Id {
    table.alloc_with(|id| id).expect("alloc").0
}

#[test]
fn freed_id_is_reissued_once_the_range_is_full() {
    let mut t = table(5);
    let ids: Vec<Id> = (0..4).map(|_| alloc(&mut t)).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    assert!(t.free(2));
    assert_eq!(alloc(&mut t), 2);
    assert!(matches!(
        t.alloc(0),
        Err(IdTableError::OutOfIds { limit: 5, .. })
    ));
}

#[test]
fn freeing_the_newest_id_reissues_it_without_compaction() {
    let mut t = table(1000);
    for _ in 1..=10 {
        alloc(&mut t);
    }

    assert!(t.free(10));
    assert_eq!(alloc(&mut t), 10);
    assert_eq!(t.stats().compactions, 0);
}

#[test]
fn compaction_reclaims_freed_slots_without_a_new_chunk() {
    let mut t = table(1000);
    let first: BTreeSet<Id> = (0..100).map(|_| alloc(&mut t)).collect();
    assert_eq!(first, (1..=100).collect::<BTreeSet<Id>>());

    for id in (2..=100).step_by(2) {
        assert!(t.free(id));
    }
    let before = t.stats();

    let mut seen = BTreeSet::new();
    for _ in 0..60 {
        let id = alloc(&mut t);
        assert!(id % 2 == 0 || !first.contains(&id), "{id} is still live");
        assert!(seen.insert(id), "{id} issued twice");
    }

    let after = t.stats();
    assert_eq!(after.chunks, before.chunks);
    assert!(after.compactions > before.compactions);
}

#[test]
fn double_free_reports_not_found() {
    let mut t = table(1000);
    let a = alloc(&mut t);
    let b = alloc(&mut t);

    assert!(t.free(a));
    assert!(!t.free(a));
    assert_eq!(t.lookup(a), None);
    assert_eq!(t.lookup(b), Some(&b));
}

#[test]
fn destroy_visits_each_live_entry_once() {
    let mut t = table(1000);
    for _ in 0..3 {
        alloc(&mut t);
    }
    assert!(t.free(2));

    let mut finalized = Vec::new();
    t.destroy(|id, payload| {
        assert_eq!(id, payload);
        finalized.push(id);
    });
    finalized.sort_unstable();
    assert_eq!(finalized, vec![1, 3]);
}

#[test]
fn alloc_at_rejects_live_and_out_of_range_ids() {
    let mut t = table(100);
    let live = alloc(&mut t);

    assert_eq!(t.alloc_at(live, 0), Err(IdTableError::AlreadyInUse(live)));
    assert!(matches!(
        t.alloc_at(100, 0),
        Err(IdTableError::IdMismatch { requested: 100, .. })
    ));
    assert_eq!(t.len(), 1);

    *t.alloc_at(42, 0).expect("alloc_at") = 42;
    assert_eq!(t.lookup(42), Some(&42));
}

#[test]
fn payloads_stay_bound_across_growth() {
    let mut t: IdTable<String> = IdTable::with_config(
        IdTableConfig::default().with_initial_growth(1),
    )
    .expect("config");

    let ids: Vec<Id> = (0..200)
        .map(|n| t.alloc(format!("payload-{n}")).expect("alloc").0)
        .collect();

    for (n, id) in ids.iter().enumerate() {
        assert_eq!(t.lookup(*id).map(String::as_str), Some(format!("payload-{n}").as_str()));
    }
    assert!(t.stats().chunks > 1);
}

#[test]
fn invalid_config_is_rejected() {
    let config = IdTableConfig::default().with_base(10).with_limit(10);
    assert!(matches!(
        IdTable::<()>::with_config(config),
        Err(IdTableError::InvalidConfig(_))
    ));
}

#[test]
fn errors_render_for_logs() {
    let e = IdTableError::OutOfIds { next: 5, limit: 5 };
    assert_eq!(e.to_string(), "no more id space 5/5");
    assert_eq!(
        IdTableError::AlreadyInUse(7).to_string(),
        "id 7 is already in use"
    );
}
