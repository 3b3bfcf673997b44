use kasten::{ArchiveMessage, FieldValue, ImportMode, LoadedArchive, flatten};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn write_message(dir: &Path, name: &str, msg: &ArchiveMessage) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, flatten(msg))?;
    Ok(path)
}

fn base_message() -> ArchiveMessage {
    let mut msg = ArchiveMessage::with_what(1);
    msg.add("title", FieldValue::String("base".into())).unwrap();
    msg.add("count", FieldValue::Int32(1)).unwrap();
    msg
}

#[test]
fn member_import_nests_the_whole_file_under_one_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = write_message(dir.path(), "base.kam", &base_message())?;

    let mut other = ArchiveMessage::with_what(2);
    other.add("payload", FieldValue::Bool(true)).unwrap();
    let other_path = write_message(dir.path(), "other.kam", &other)?;

    let mut archive = LoadedArchive::load_path(&base)?;
    archive.import_from_path(
        &other_path,
        &ImportMode::Member {
            name: "attachment".into(),
        },
    )?;

    assert!(archive.dirty);
    let member = archive.root.find_message("attachment", 0).unwrap();
    assert_eq!(member, &other);
    // original fields are untouched
    assert_eq!(archive.root.find_str("title", 0), Some("base"));
    Ok(())
}

#[test]
fn member_import_into_an_existing_message_field_appends() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut base = base_message();
    base.add("attachment", FieldValue::Message(ArchiveMessage::with_what(9)))
        .unwrap();
    let base_path = write_message(dir.path(), "base.kam", &base)?;
    let other_path = write_message(dir.path(), "other.kam", &base_message())?;

    let mut archive = LoadedArchive::load_path(&base_path)?;
    archive.import_from_path(
        &other_path,
        &ImportMode::Member {
            name: "attachment".into(),
        },
    )?;
    assert_eq!(archive.root.count_values("attachment"), 2);
    Ok(())
}

#[test]
fn contents_import_appends_field_by_field() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = write_message(dir.path(), "base.kam", &base_message())?;

    let mut other = ArchiveMessage::new();
    other.add("count", FieldValue::Int32(2)).unwrap();
    other.add("count", FieldValue::Int32(3)).unwrap();
    other.add("fresh", FieldValue::String("new field".into())).unwrap();
    let other_path = write_message(dir.path(), "other.kam", &other)?;

    let mut archive = LoadedArchive::load_path(&base)?;
    archive.import_from_path(&other_path, &ImportMode::Contents)?;

    assert_eq!(archive.root.count_values("count"), 3);
    assert_eq!(archive.root.find_int32("count", 1), Some(2));
    assert_eq!(archive.root.find_int32("count", 2), Some(3));
    assert_eq!(archive.root.find_str("fresh", 0), Some("new field"));
    // the imported file itself is untouched on disk
    assert_eq!(std::fs::read(&other_path)?, flatten(&other));
    Ok(())
}

#[test]
fn contents_import_with_a_type_conflict_applies_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = write_message(dir.path(), "base.kam", &base_message())?;

    let mut other = ArchiveMessage::new();
    // the clean field sorts before the conflicting one on purpose
    other.add("fresh", FieldValue::Bool(true)).unwrap();
    other
        .add("count", FieldValue::String("not an int".into()))
        .unwrap();
    let other_path = write_message(dir.path(), "other.kam", &other)?;

    let mut archive = LoadedArchive::load_path(&base)?;
    let before = archive.root.clone();
    assert!(
        archive
            .import_from_path(&other_path, &ImportMode::Contents)
            .is_err()
    );
    assert_eq!(archive.root, before);
    assert!(!archive.dirty);
    Ok(())
}

#[test]
fn importing_a_corrupt_file_reports_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = write_message(dir.path(), "base.kam", &base_message())?;
    let bad = dir.path().join("bad.kam");
    std::fs::write(&bad, b"KAM1 but then garbage")?;

    let mut archive = LoadedArchive::load_path(&base)?;
    let before = archive.root.clone();
    assert!(
        archive
            .import_from_path(&bad, &ImportMode::Member { name: "x".into() })
            .is_err()
    );
    assert_eq!(archive.root, before);
    Ok(())
}
