use nx_byml::{error::Result, BigData, Byml, Hash, Node};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tracing_test::traced_test;

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::Bool),
        any::<i32>().prop_map(Node::Int),
        (-1.0e6f32..1.0e6f32).prop_map(Node::Float),
        any::<u32>().prop_map(Node::UInt),
        any::<i64>().prop_map(|v| Node::Int64(BigData::new(v))),
        any::<u64>().prop_map(|v| Node::UInt64(BigData::new(v))),
        (-1.0e12f64..1.0e12f64).prop_map(|v| Node::Double(BigData::new(v))),
        "[A-Za-z0-9_ ]{0,12}".prop_map(Node::String),
    ]
}

fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(5, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Node::Array),
            prop::collection::btree_map("[A-Za-z_]{1,10}", inner, 0..8)
                .prop_map(|entries| Node::Hash(entries.into_iter().collect())),
            prop::collection::vec("[a-z]{0,6}", 0..4).prop_map(Node::StringTable),
        ]
    })
}

fn root() -> impl Strategy<Value = Node> {
    node().prop_map(|node| match node {
        root @ (Node::Array(_) | Node::Hash(_)) => root,
        other => Node::Array(vec![other]),
    })
}

proptest! {
    #[test]
    fn node_round_trip(root in root(), version in 2u16..=4) {
        let byml = Byml { version, root };
        let bytes = byml.to_bytes().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let parsed = Byml::parse(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(parsed, byml);
    }

    #[test]
    fn encoding_is_deterministic(root in root()) {
        let first = nx_byml::to_bytes(&root).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let parsed = nx_byml::from_bytes(&first).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = nx_byml::to_bytes(&parsed).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(first, second);
    }
}

#[traced_test]
#[test]
fn set_node_on_missing_key_leaves_bytes_unchanged() -> Result<()> {
    let root: Hash = [("Enemy", Node::from("Lizalfos")), ("Count", Node::Int(3))]
        .into_iter()
        .collect();
    let original = nx_byml::to_bytes(&Node::Hash(root))?;

    let mut parsed = nx_byml::from_bytes(&original)?;
    assert!(!parsed.as_hash_mut()?.set_node("Boss", Node::Bool(true)));
    assert_eq!(nx_byml::to_bytes(&parsed)?, original);

    assert!(parsed.as_hash_mut()?.set_node("Count", Node::Int(4)));
    let edited = nx_byml::to_bytes(&parsed)?;
    assert_eq!(nx_byml::from_bytes(&edited)?.get("Count")?.as_int()?, 4);
    assert_eq!(edited.len(), original.len());

    Ok(())
}

#[test]
fn nested_documents_keep_shared_tables() -> Result<()> {
    let actor = |name: &str, life: i32| {
        Node::Hash(
            [("Name", Node::from(name)), ("Life", Node::Int(life))]
                .into_iter()
                .collect(),
        )
    };
    let root = Node::Hash(
        [(
            "Actors",
            Node::Array(vec![actor("Bokoblin", 13), actor("Moblin", 50), actor("Bokoblin", 20)]),
        )]
        .into_iter()
        .collect(),
    );

    let bytes = nx_byml::to_bytes(&root)?;
    let parsed = nx_byml::from_bytes(&bytes)?;
    assert_eq!(parsed, root);

    // Each distinct string is stored once
    let occurrences = bytes
        .windows(b"Bokoblin".len())
        .filter(|w| *w == b"Bokoblin")
        .count();
    assert_eq!(occurrences, 1);

    Ok(())
}

#[test]
fn string_table_values_trim_padding() -> Result<()> {
    let root = Node::Array(vec![Node::StringTable(vec![
        "first".into(),
        String::new(),
        "third".into(),
    ])]);

    let parsed = nx_byml::from_bytes(&nx_byml::to_bytes(&root)?)?;
    assert_eq!(
        parsed.as_array()?[0].as_string_table()?,
        &vec!["first".to_string(), String::new(), "third".to_string()]
    );

    Ok(())
}
