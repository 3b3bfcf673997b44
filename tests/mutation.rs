use kasten::{
    ArchiveMessage, EditorBuffer, EditorState, FieldValue, LoadedArchive, Rect, commit_chain,
    flatten, resolve_selection,
};
use pretty_assertions::assert_eq;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[test]
fn editing_a_rect_value_updates_exactly_that_value() {
    let mut msg = ArchiveMessage::new();
    msg.add("sibling", FieldValue::Bool(true)).unwrap();
    msg.add(
        "frame",
        FieldValue::Rect(Rect {
            left: 0.0,
            top: 0.0,
            right: 10.0,
            bottom: 10.0,
        }),
    )
    .unwrap();

    let mut editor = EditorState::for_value("frame", 0, msg.find("frame", 0).unwrap());
    editor.buffer = EditorBuffer::Rect {
        left: 1.0,
        top: 1.0,
        right: 20.0,
        bottom: 20.0,
    };
    editor.apply(&mut msg).unwrap();

    assert_eq!(
        msg.find("frame", 0),
        Some(&FieldValue::Rect(Rect {
            left: 1.0,
            top: 1.0,
            right: 20.0,
            bottom: 20.0,
        }))
    );
    assert_eq!(msg.find_bool("sibling", 0), Some(true));
    assert_eq!(msg.count_names(), 2);
}

#[test]
fn nested_int32_edit_commits_through_the_chain() {
    // outer { inner { value: 5 } }, selection path [0, 0]
    let mut inner = ArchiveMessage::new();
    inner.add("value", FieldValue::Int32(5)).unwrap();
    let mut root = ArchiveMessage::new();
    root.add("outer", FieldValue::Message(inner)).unwrap();

    let target = resolve_selection(&root, &[0, 0]).unwrap();
    let leaf = target.leaf.clone().unwrap();
    assert_eq!(leaf.name, "value");
    assert_eq!(target.chain.len(), 1);

    let mut chain = target.chain;
    let mut editor = EditorState::for_value(
        &leaf.name,
        0,
        chain.last().unwrap().message.find(&leaf.name, 0).unwrap(),
    );
    editor.buffer = EditorBuffer::Integer {
        code: kasten::TypeCode::Int32,
        text: "7".to_string(),
    };
    editor.apply(&mut chain.last_mut().unwrap().message).unwrap();
    commit_chain(&mut root, chain).unwrap();

    assert_eq!(
        root.find_message("outer", 0)
            .and_then(|m| m.find_int32("value", 0)),
        Some(7)
    );
}

#[test]
fn empty_chain_commit_mutates_only_the_target_field() {
    let mut root = ArchiveMessage::new();
    root.add("a", FieldValue::Int32(1)).unwrap();
    root.add("b", FieldValue::Int32(2)).unwrap();
    root.add("c", FieldValue::Int32(3)).unwrap();
    let before = flatten(&root);

    let target = resolve_selection(&root, &[1]).unwrap();
    assert!(target.chain.is_empty());
    let leaf = target.leaf.unwrap();
    root.replace(&leaf.name, 0, FieldValue::Int32(20)).unwrap();
    commit_chain(&mut root, target.chain).unwrap();

    assert_eq!(root.find_int32("a", 0), Some(1));
    assert_eq!(root.find_int32("b", 0), Some(20));
    assert_eq!(root.find_int32("c", 0), Some(3));
    assert_ne!(flatten(&root), before);
}

#[test]
fn cancel_leaves_the_document_untouched() {
    let mut msg = ArchiveMessage::new();
    msg.add("value", FieldValue::Int32(5)).unwrap();
    let before = msg.clone();

    // opening an editor and dropping it is a cancel
    let mut editor = EditorState::for_value("value", 0, msg.find("value", 0).unwrap());
    editor.buffer = EditorBuffer::Integer {
        code: kasten::TypeCode::Int32,
        text: "9999".to_string(),
    };
    drop(editor);
    assert_eq!(msg, before);
}

#[test]
fn delete_last_value_removes_the_field_and_saves() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("doc.kam");

    let mut msg = ArchiveMessage::new();
    msg.add("keep", FieldValue::Int32(1)).unwrap();
    msg.add("drop", FieldValue::String("bye".into())).unwrap();
    std::fs::write(&path, flatten(&msg))?;

    let mut archive = LoadedArchive::load_path(&path)?;
    archive.root.remove_value("drop", 0)?;
    archive.mark_dirty();
    archive.save_to_path(&path)?;

    let back = LoadedArchive::load_path(&path)?;
    assert_eq!(back.root.count_names(), 1);
    assert_eq!(back.root.type_of("drop"), None);
    assert_eq!(back.root.find_int32("keep", 0), Some(1));
    Ok(())
}
