use kasten::{
    ArchiveMessage, FieldValue, SelectionError, TypeCode, commit_chain, flatten, resolve_selection,
};
use pretty_assertions::assert_eq;

/// depth levels of nesting, each level holding a "label" string and a
/// single-value "sub" message field (except the innermost).
fn deep(depth: usize) -> ArchiveMessage {
    let mut msg = ArchiveMessage::with_what(depth as u32);
    msg.add("label", FieldValue::String(format!("level {depth}")))
        .unwrap();
    if depth > 0 {
        msg.add("sub", FieldValue::Message(deep(depth - 1))).unwrap();
    }
    msg
}

#[test]
fn chain_links_mirror_the_documents_at_each_depth() {
    let root = deep(4);
    // leaf "label" row, then four "sub" rows back up to the root
    let path = [0, 1, 1, 1, 1];
    let target = resolve_selection(&root, &path).unwrap();

    assert_eq!(target.chain.len(), 4);
    let mut expected = &root;
    for link in &target.chain {
        expected = expected.find_message("sub", 0).unwrap();
        assert_eq!(&link.message, expected);
        assert_eq!(link.field_name, "sub");
        assert_eq!(link.member_index, 0);
    }

    let leaf = target.leaf.as_ref().unwrap();
    assert_eq!(leaf.name, "label");
    assert_eq!(leaf.type_code, TypeCode::String);
    assert_eq!(target.scope(&root).find_str("label", 0), Some("level 0"));
}

#[test]
fn member_indices_disambiguate_multi_value_message_fields() {
    let mut root = ArchiveMessage::new();
    for i in 0..3 {
        let mut member = ArchiveMessage::new();
        member.add("id", FieldValue::Int32(i)).unwrap();
        root.add("members", FieldValue::Message(member)).unwrap();
    }
    root.add("tail", FieldValue::Bool(false)).unwrap();

    for member in 0..3 {
        let target = resolve_selection(&root, &[0, member, 0]).unwrap();
        assert_eq!(target.chain[0].member_index, member as usize);
        assert_eq!(
            target.scope(&root).find_int32("id", 0),
            Some(member)
        );
    }

    assert!(matches!(
        resolve_selection(&root, &[0, 3, 0]),
        Err(SelectionError::MemberOutOfRange { index: 3, .. })
    ));
    assert!(matches!(
        resolve_selection(&root, &[0]),
        Err(SelectionError::MemberIndexMissing { .. })
    ));
}

#[test]
fn commit_changes_exactly_one_root_field() {
    let mut root = deep(2);
    root.add("untouched", FieldValue::Int32(17)).unwrap();
    let before = root.clone();

    let target = resolve_selection(&root, &[0, 1, 1]).unwrap();
    let mut chain = target.chain;
    chain
        .last_mut()
        .unwrap()
        .message
        .replace("label", 0, FieldValue::String("edited".into()))
        .unwrap();
    commit_chain(&mut root, chain).unwrap();

    // only the "sub" field changed at the root
    assert_eq!(root.find_str("label", 0), before.find_str("label", 0));
    assert_eq!(root.find_int32("untouched", 0), Some(17));
    assert_ne!(
        root.find_message("sub", 0),
        before.find_message("sub", 0)
    );
    assert_eq!(
        root.find_message("sub", 0)
            .and_then(|m| m.find_message("sub", 0))
            .and_then(|m| m.find_str("label", 0)),
        Some("edited")
    );
}

#[test]
fn commit_matches_a_manual_fold() {
    let mut by_chain = deep(3);
    let mut by_hand = by_chain.clone();

    // through the chain
    let target = resolve_selection(&by_chain, &[0, 1, 1, 1]).unwrap();
    let mut chain = target.chain;
    chain
        .last_mut()
        .unwrap()
        .message
        .replace("label", 0, FieldValue::String("deep edit".into()))
        .unwrap();
    commit_chain(&mut by_chain, chain).unwrap();

    // by hand, rebuilding each level from the inside out
    let l1 = by_hand.find_message("sub", 0).unwrap().clone();
    let l2 = l1.find_message("sub", 0).unwrap().clone();
    let mut l3 = l2.find_message("sub", 0).unwrap().clone();
    l3.replace("label", 0, FieldValue::String("deep edit".into()))
        .unwrap();
    let mut l2 = l2;
    l2.replace("sub", 0, FieldValue::Message(l3)).unwrap();
    let mut l1 = l1;
    l1.replace("sub", 0, FieldValue::Message(l2)).unwrap();
    by_hand.replace("sub", 0, FieldValue::Message(l1)).unwrap();

    assert_eq!(by_chain, by_hand);
    assert_eq!(flatten(&by_chain), flatten(&by_hand));
}

#[test]
fn failed_commit_leaves_the_root_untouched() {
    let mut root = deep(1);
    let before = root.clone();

    let target = resolve_selection(&root, &[0, 1]).unwrap();
    let mut chain = target.chain;
    // sabotage the link so the final replace cannot find its field
    chain[0].field_name = "gone".to_string();
    assert!(commit_chain(&mut root, chain).is_err());
    assert_eq!(root, before);
}
