//! End-to-end scenarios driven purely through the `Backend` facade.
use maplit::hashmap;
use mergeset_backend::Backend;
use mergeset_backend::protocol::{
    ActorId, Change, ChangeRequest, Diff, ObjType, Op, OpId, OpType, ReqOpType, RequestKey,
    RequestOp, RequestType, ScalarValue,
};

fn request(actor: &str, seq: u64, version: u64, ops: Vec<RequestOp>) -> ChangeRequest {
    ChangeRequest {
        actor: actor.into(),
        seq,
        version,
        time: 0,
        message: None,
        request_type: RequestType::Change,
        ops,
    }
}

fn encoded(change: &Change) -> Vec<u8> {
    mergeset_backend::encode_change(change)
}

fn set_op(obj: &str, key: &str, value: ScalarValue) -> RequestOp {
    RequestOp {
        action: ReqOpType::Set,
        obj: obj.into(),
        key: RequestKey::Str(key.into()),
        child: None,
        value: Some(value),
        insert: false,
    }
}

// S1: simple map set.
#[test]
fn simple_map_set() {
    let mut backend = Backend::init();
    let (_, patch) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();

    assert_eq!(patch.clock, hashmap! { ActorId::from("A") => 1 });
    assert_eq!(patch.max_op, 1);
    let id = OpId::new(1, &"A".into());
    let by_op = patch.diffs.props.get("x").expect("x was set");
    assert_eq!(by_op.get(&id), Some(&Diff::Value(ScalarValue::Int(1))));
}

// S2: list insert + delete.
#[test]
fn list_insert_and_delete() {
    let mut backend = Backend::init();
    let make_list = RequestOp {
        action: ReqOpType::MakeList,
        obj: "_root".into(),
        key: RequestKey::Str("xs".into()),
        child: Some("list1".into()),
        value: None,
        insert: false,
    };
    let insert = |index: u64, value: &str| RequestOp {
        action: ReqOpType::Set,
        obj: "list1".into(),
        key: RequestKey::Num(index),
        child: None,
        value: Some(ScalarValue::Str(value.into())),
        insert: true,
    };
    let delete = RequestOp {
        action: ReqOpType::Del,
        obj: "list1".into(),
        key: RequestKey::Num(1),
        child: None,
        value: None,
        insert: false,
    };

    let req = request(
        "A",
        1,
        0,
        vec![make_list, insert(0, "a"), insert(1, "b"), insert(2, "c"), delete],
    );
    let (_, patch) = backend.apply_local_change(req).unwrap();

    let list_obj_id = OpId::new(1, &"A".into());
    let by_op = patch
        .diffs
        .props
        .get("xs")
        .expect("xs was created")
        .get(&list_obj_id)
        .expect("list1 has an entry keyed by its own op id");
    let Diff::Seq(seq_diff) = by_op else {
        panic!("expected a seq diff, got {by_op:?}");
    };
    assert_eq!(seq_diff.obj_type, ObjType::List);
    let values: Vec<_> = seq_diff
        .edits
        .iter()
        .map(|edit| match edit {
            mergeset_backend::protocol::DiffEdit::Insert { values, .. } => {
                assert_eq!(values.len(), 1, "single-writer element should have one value");
                values.values().next().unwrap().clone()
            }
            other => panic!("unexpected edit {other:?}"),
        })
        .collect();
    assert_eq!(
        values,
        vec![
            Diff::Value(ScalarValue::Str("a".into())),
            Diff::Value(ScalarValue::Str("c".into())),
        ]
    );
}

// S3: concurrent set, applied remotely at a third backend.
#[test]
fn concurrent_set_surfaces_both_as_conflicts() {
    let change_a = Change {
        actor: "A".into(),
        seq: 1,
        start_op: 1,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Str("A".into())),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "k".into(),
            pred: vec![],
            insert: false,
        }],
    };
    let change_b = Change {
        actor: "B".into(),
        seq: 1,
        start_op: 1,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Str("B".into())),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "k".into(),
            pred: vec![],
            insert: false,
        }],
    };

    let mut backend = Backend::init();
    let (_, patch) = backend
        .apply_changes(vec![encoded(&change_a), encoded(&change_b)])
        .unwrap();

    let by_op = patch.diffs.props.get("k").expect("k was set by both actors");
    assert_eq!(by_op.len(), 2, "both concurrent writes survive as conflicts");
    let id_a = OpId::new(1, &"A".into());
    let id_b = OpId::new(1, &"B".into());
    assert_eq!(by_op.get(&id_a), Some(&Diff::Value(ScalarValue::Str("A".into()))));
    assert_eq!(by_op.get(&id_b), Some(&Diff::Value(ScalarValue::Str("B".into()))));
}

// S4: counter increments.
#[test]
fn counter_increments_fold_onto_the_base_set() {
    let change_set = Change {
        actor: "A".into(),
        seq: 1,
        start_op: 1,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Counter(0)),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "c".into(),
            pred: vec![],
            insert: false,
        }],
    };
    let base = OpId::new(1, &"A".into());
    let inc_by_b = Change {
        actor: "B".into(),
        seq: 1,
        start_op: 2,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Inc(3),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "c".into(),
            pred: vec![base.clone()],
            insert: false,
        }],
    };
    let inc_by_c = Change {
        actor: "C".into(),
        seq: 1,
        start_op: 3,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Inc(4),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "c".into(),
            pred: vec![base],
            insert: false,
        }],
    };

    let mut backend = Backend::init();
    let (_, patch) = backend
        .apply_changes(vec![encoded(&change_set), encoded(&inc_by_b), encoded(&inc_by_c)])
        .unwrap();

    let id = OpId::new(1, &"A".into());
    let by_op = patch.diffs.props.get("c").expect("c was set");
    assert_eq!(by_op.get(&id), Some(&Diff::Value(ScalarValue::Counter(7))));
}

// S5: missing-deps buffering.
#[test]
fn missing_deps_are_buffered_until_satisfied() {
    let change1 = Change {
        actor: "A".into(),
        seq: 1,
        start_op: 1,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Int(1)),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "x".into(),
            pred: vec![],
            insert: false,
        }],
    };
    let hash1 = {
        // Only the backend can compute a change's hash; apply change1 alone
        // to a throwaway backend to recover it.
        let mut solo = Backend::init();
        let (solo, _) = solo.apply_changes(vec![encoded(&change1)]).unwrap();
        let heads = solo.get_heads().unwrap();
        assert_eq!(heads.len(), 1);
        heads[0]
    };
    let change2 = Change {
        actor: "B".into(),
        seq: 1,
        start_op: 2,
        deps: vec![hash1],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Int(2)),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "y".into(),
            pred: vec![],
            insert: false,
        }],
    };

    let mut backend = Backend::init();
    let (mut backend, _) = backend.apply_changes(vec![encoded(&change2)]).unwrap();
    assert!(backend.get_patch().unwrap().diffs.props.get("y").is_none());
    assert_eq!(backend.get_missing_deps().unwrap(), vec![hash1]);

    let (backend, patch) = backend.apply_changes(vec![encoded(&change1)]).unwrap();
    assert!(patch.diffs.props.contains_key("x"));
    assert!(patch.diffs.props.contains_key("y"));
    assert!(backend.get_missing_deps().unwrap().is_empty());
}

// S6: a local change authored against a stale base version still applies
// on top of a remote change that landed in the meantime.
#[test]
fn local_change_against_a_stale_base_version() {
    let mut backend = Backend::init();
    let remote = Change {
        actor: "B".into(),
        seq: 1,
        start_op: 1,
        deps: vec![],
        time: 0,
        message: None,
        ops: vec![Op {
            action: OpType::Set(ScalarValue::Int(1)),
            obj: mergeset_backend::protocol::ObjectId::Root,
            key: "remote".into(),
            pred: vec![],
            insert: false,
        }],
    };
    let (mut backend, _) = backend.apply_changes(vec![encoded(&remote)]).unwrap();

    // Authored against version 0, before the remote change landed.
    let (backend, patch) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "local", ScalarValue::Int(2))],
        ))
        .unwrap();

    assert!(patch.diffs.props.contains_key("local"));
    let final_patch = backend.get_patch().unwrap();
    assert!(final_patch.diffs.props.contains_key("remote"));
    assert!(final_patch.diffs.props.contains_key("local"));
}

// Invariant 2 / 6: getChanges round-trips into a fresh backend, and
// save/load round-trips getPatch().
#[test]
fn get_changes_round_trips_into_a_fresh_backend() {
    let mut backend = Backend::init();
    let (backend, _) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();

    let changes = backend.get_changes(&[]).unwrap();
    let mut fresh = Backend::init();
    let fresh = fresh.load_changes(changes).unwrap();

    assert_eq!(fresh.get_heads().unwrap(), backend.get_heads().unwrap());
    assert_eq!(fresh.get_patch().unwrap().max_op, backend.get_patch().unwrap().max_op);
}

#[test]
fn save_then_load_round_trips_get_patch() {
    let mut backend = Backend::init();
    let (backend, _) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();

    let bytes = backend.save().unwrap();
    let loaded = Backend::load(&bytes).unwrap();

    assert_eq!(loaded.get_patch().unwrap(), backend.get_patch().unwrap());
}

// Using a frozen backend surfaces StaleBackend rather than silently
// reading superseded state.
#[test]
fn using_a_frozen_backend_errors() {
    let mut backend = Backend::init();
    let (_new_backend, _patch) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();

    let err = backend.get_patch().unwrap_err();
    assert!(matches!(err, mergeset_backend::MergesetError::StaleBackend));
}

// Invariant 5: applyLocalChange advances the author's clock to exactly seq.
#[test]
fn clock_tracks_seq_after_local_apply() {
    let mut backend = Backend::init();
    let (mut backend, patch) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();
    assert_eq!(patch.clock.get(&ActorId::from("A")), Some(&1));

    let (_, patch2) = backend
        .apply_local_change(request(
            "A",
            2,
            1,
            vec![set_op("_root", "x", ScalarValue::Int(2))],
        ))
        .unwrap();
    assert_eq!(patch2.clock.get(&ActorId::from("A")), Some(&2));
}

// A resubmitted seq is rejected rather than silently re-applied.
#[test]
fn resubmitting_an_already_applied_seq_errors() {
    let mut backend = Backend::init();
    let (mut backend, _) = backend
        .apply_local_change(request(
            "A",
            1,
            0,
            vec![set_op("_root", "x", ScalarValue::Int(1))],
        ))
        .unwrap();

    let err = backend
        .apply_local_change(request(
            "A",
            1,
            1,
            vec![set_op("_root", "x", ScalarValue::Int(99))],
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        mergeset_backend::MergesetError::AlreadyApplied { .. }
    ));
}
