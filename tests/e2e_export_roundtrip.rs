//! Round-trip tests: notation rendering -> re-parse, and backend dump ->
//! re-load into a fresh store.

use geoff::export::{dump_name, export_geoff_dump};
use geoff::storage::StorageBackend;
use geoff::{parse, AbstractNode, Loader, MemoryBackend, PropertyMap, TxMode, Value};
use proptest::prelude::*;

// ============================================================================
// 1. AbstractNode rendering
// ============================================================================

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,10}"
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "\\PC{0,12}".prop_map(Value::String),
        prop::collection::vec(any::<i64>(), 1..4).prop_map(Value::IntArray),
        prop::collection::vec(-1.0e3f64..1.0e3, 1..4).prop_map(Value::FloatArray),
        prop::collection::vec("[a-z ]{0,5}", 1..4).prop_map(Value::StringArray),
        prop::collection::vec(any::<bool>(), 1..4).prop_map(Value::BoolArray),
    ]
}

fn arb_node() -> impl Strategy<Value = AbstractNode> {
    (
        prop::option::of(arb_ident()),
        prop::collection::btree_set(arb_ident(), 0..3),
        prop::collection::hash_map(arb_ident(), arb_value(), 0..4),
    )
        .prop_map(|(name, labels, properties)| {
            let mut node = AbstractNode::new(name);
            node.labels = labels;
            node.properties = properties;
            node
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn node_notation_reparses(node in arb_node()) {
        let text = node.to_string();
        let parsed = parse(&text);
        prop_assert!(parsed.is_ok(), "Failed to parse: {} (from {:?})", text, node);

        let parsed = parsed.unwrap();
        prop_assert_eq!(parsed.order(), 1);
        let again = parsed.nodes().next().unwrap();

        prop_assert_eq!(again.is_named(), node.is_named());
        if node.is_named() {
            prop_assert_eq!(again.name(), node.name());
        }
        prop_assert_eq!(&again.labels, &node.labels);
        prop_assert_eq!(&again.properties, &node.properties);
    }

    #[test]
    fn hooked_node_notation_reparses(
        name in arb_ident(),
        label in arb_ident(),
        keys in prop::collection::vec(arb_ident(), 1..3),
        optional in any::<bool>(),
    ) {
        let node = AbstractNode::named(name).with_hook(label, keys, optional);
        let parsed = parse(&node.to_string()).unwrap();
        let again = parsed.node(node.name()).unwrap();
        prop_assert_eq!(again, &node);
    }
}

// ============================================================================
// 2. Backend dump
// ============================================================================

async fn seed(db: &MemoryBackend) {
    let alice = db.insert_node(&["Person"], PropertyMap::from([
        ("name".to_string(), Value::from("Alice")),
        ("age".to_string(), Value::Int(30)),
    ]));
    let bob = db.insert_node(&["Person", "Admin"], PropertyMap::from([
        ("name".to_string(), Value::from("Bob \"B\"")),
    ]));
    let acme = db.insert_node(&["Company"], PropertyMap::from([
        ("scores".to_string(), Value::FloatArray(vec![0.5, 2.0])),
    ]));

    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    db.create_relationship(&mut tx, alice, bob, "KNOWS").await.unwrap();
    let works = db.create_relationship(&mut tx, alice, acme, "WORKS_AT").await.unwrap();
    db.set_relationship_property(&mut tx, works, "since", Value::Int(2019)).await.unwrap();
    db.commit_tx(tx).await.unwrap();
}

async fn dump(db: &MemoryBackend) -> String {
    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    let mut out = Vec::new();
    export_geoff_dump(db, &tx, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_dump_parses_back() {
    let db = MemoryBackend::new();
    seed(&db).await;

    let g = parse(&dump(&db).await).unwrap();
    assert_eq!(g.order(), 3);
    assert_eq!(g.size(), 2);
    assert_eq!(g.comments().len(), 1);

    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    for node in db.all_nodes(&tx).await.unwrap() {
        let parsed = g.node(&dump_name(node.id)).unwrap();
        assert_eq!(parsed.properties, node.properties);
        assert!(node.labels.iter().all(|l| parsed.has_label(l)));
    }
}

#[tokio::test]
async fn test_dump_reloads_into_fresh_store() {
    let db = MemoryBackend::new();
    seed(&db).await;
    let text = dump(&db).await;

    let copy = Loader::open_memory();
    copy.load_str(&text).await.unwrap();

    assert_eq!(dump(copy.backend()).await.lines().count(), text.lines().count());

    let tx = copy.backend().begin_tx(TxMode::ReadOnly).await.unwrap();
    assert_eq!(copy.backend().node_count(&tx).await.unwrap(), 3);
    let rels = copy.backend().all_relationships(&tx).await.unwrap();
    assert_eq!(rels.len(), 2);
    assert!(rels.iter().any(|r| r.rel_type == "WORKS_AT" && r.get("since") == Some(&Value::Int(2019))));
}
