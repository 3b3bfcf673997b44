use crate::message::ArchiveMessage;
use crate::value::FieldValue;
use crate::wire;
use anyhow::{Context, bail};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// How a second archive file is merged into the open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMode {
    /// Add the whole imported message as one nested-message value.
    Member { name: String },
    /// Append every field of the imported message value-by-value.
    Contents,
}

/// A loaded archive file, preserving its original bytes to ensure
/// byte-for-byte roundtripping if unmodified.
#[derive(Debug, Clone)]
pub struct LoadedArchive {
    pub source_path: PathBuf,
    pub original_bytes: Vec<u8>,
    pub root: ArchiveMessage,
    pub dirty: bool,
    disk_mtime: Option<SystemTime>,
}

impl LoadedArchive {
    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let root = wire::unflatten(&bytes).with_context(|| format!("parsing {path:?}"))?;
        let disk_mtime = file_mtime(path);
        Ok(Self {
            source_path: path.to_path_buf(),
            original_bytes: bytes,
            root,
            dirty: false,
            disk_mtime,
        })
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Bytes to write on save. An unmodified document saves back its original
    /// bytes untouched.
    pub fn save_bytes(&self) -> Vec<u8> {
        if !self.dirty {
            return self.original_bytes.clone();
        }
        wire::flatten(&self.root)
    }

    pub fn save_to_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = self.save_bytes();
        fs::write(path, &bytes).with_context(|| format!("writing {path:?}"))?;
        self.source_path = path.to_path_buf();
        self.original_bytes = bytes;
        self.dirty = false;
        self.disk_mtime = file_mtime(path);
        Ok(())
    }

    /// Re-read the document from its source path, discarding in-memory edits.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        let fresh = Self::load_path(&self.source_path)?;
        *self = fresh;
        Ok(())
    }

    /// Poll the source file for an external modification. Returns true only
    /// when the file's data actually differs from the in-memory document, so
    /// touch-only changes (and our own saves) stay quiet.
    pub fn external_change(&mut self) -> anyhow::Result<bool> {
        let mtime = file_mtime(&self.source_path);
        if mtime == self.disk_mtime {
            return Ok(false);
        }
        self.disk_mtime = mtime;
        let bytes = fs::read(&self.source_path)
            .with_context(|| format!("re-reading {:?}", self.source_path))?;
        let on_disk = wire::unflatten(&bytes)
            .with_context(|| format!("parsing {:?}", self.source_path))?;
        Ok(on_disk != self.root)
    }

    /// Merge another archive file into the document. Contents mode validates
    /// every field for type compatibility before touching the document, so a
    /// conflict aborts with nothing applied.
    pub fn import_from_path(&mut self, path: &Path, mode: &ImportMode) -> anyhow::Result<()> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let imported = wire::unflatten(&bytes).with_context(|| format!("parsing {path:?}"))?;

        match mode {
            ImportMode::Member { name } => {
                self.root
                    .add(name, FieldValue::Message(imported))
                    .with_context(|| format!("adding imported message as {name:?}"))?;
            }
            ImportMode::Contents => {
                for name in imported.field_names() {
                    let (Some(incoming), Some(existing)) =
                        (imported.type_of(name), self.root.type_of(name))
                    else {
                        continue;
                    };
                    if incoming != existing {
                        bail!(
                            "field {name:?} holds {} here but {} in {path:?}",
                            existing.type_name(),
                            incoming.type_name()
                        );
                    }
                }
                for name in imported.field_names() {
                    for value in imported.values(name) {
                        self.root
                            .add(name, value.clone())
                            .with_context(|| format!("merging field {name:?}"))?;
                    }
                }
            }
        }
        self.mark_dirty();
        Ok(())
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ArchiveMessage {
        let mut msg = ArchiveMessage::with_what(7);
        msg.add("count", FieldValue::Int32(3)).unwrap();
        msg.add("label", FieldValue::String("box".into())).unwrap();
        msg
    }

    fn write_sample(dir: &Path, name: &str, msg: &ArchiveMessage) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, wire::flatten(msg)).unwrap();
        path
    }

    #[test]
    fn unmodified_archive_saves_original_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());
        let original = fs::read(&path).unwrap();

        let archive = LoadedArchive::load_path(&path).unwrap();
        assert!(!archive.dirty);
        assert_eq!(archive.save_bytes(), original);
    }

    #[test]
    fn save_then_load_preserves_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());

        let mut archive = LoadedArchive::load_path(&path).unwrap();
        archive.root.replace("count", 0, FieldValue::Int32(9)).unwrap();
        archive.mark_dirty();
        archive.save_to_path(&path).unwrap();
        assert!(!archive.dirty);

        let back = LoadedArchive::load_path(&path).unwrap();
        assert_eq!(back.root.find_int32("count", 0), Some(9));
        assert_eq!(back.root, archive.root);
    }

    #[test]
    fn reload_discards_in_memory_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());

        let mut archive = LoadedArchive::load_path(&path).unwrap();
        archive.root.replace("count", 0, FieldValue::Int32(9)).unwrap();
        archive.mark_dirty();
        archive.reload().unwrap();
        assert!(!archive.dirty);
        assert_eq!(archive.root.find_int32("count", 0), Some(3));
    }

    // mtime granularity can swallow back-to-back writes; give the clock room
    fn let_mtime_advance() {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    #[test]
    fn external_change_reports_only_real_data_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());
        let mut archive = LoadedArchive::load_path(&path).unwrap();

        // untouched file stays quiet
        assert!(!archive.external_change().unwrap());

        // rewriting identical bytes bumps the mtime but not the data
        let_mtime_advance();
        fs::write(&path, wire::flatten(&sample())).unwrap();
        assert!(!archive.external_change().unwrap());

        // a real data change is reported, once
        let_mtime_advance();
        let mut changed = sample();
        changed.replace("count", 0, FieldValue::Int32(42)).unwrap();
        fs::write(&path, wire::flatten(&changed)).unwrap();
        assert!(archive.external_change().unwrap());
        assert!(!archive.external_change().unwrap());
    }

    #[test]
    fn own_saves_do_not_look_like_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());
        let mut archive = LoadedArchive::load_path(&path).unwrap();

        let_mtime_advance();
        archive.root.replace("count", 0, FieldValue::Int32(9)).unwrap();
        archive.mark_dirty();
        archive.save_to_path(&path).unwrap();

        assert!(!archive.external_change().unwrap());
    }

    #[test]
    fn import_member_adds_one_nested_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());
        let other_path = write_sample(dir.path(), "b.kam", &sample());

        let mut archive = LoadedArchive::load_path(&path).unwrap();
        archive
            .import_from_path(
                &other_path,
                &ImportMode::Member {
                    name: "imported".into(),
                },
            )
            .unwrap();
        assert!(archive.dirty);
        let member = archive.root.find_message("imported", 0).unwrap();
        assert_eq!(member.find_int32("count", 0), Some(3));
    }

    #[test]
    fn import_contents_merges_value_by_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());

        let mut other = ArchiveMessage::new();
        other.add("count", FieldValue::Int32(8)).unwrap();
        other.add("extra", FieldValue::Bool(true)).unwrap();
        let other_path = write_sample(dir.path(), "b.kam", &other);

        let mut archive = LoadedArchive::load_path(&path).unwrap();
        archive
            .import_from_path(&other_path, &ImportMode::Contents)
            .unwrap();
        assert_eq!(archive.root.count_values("count"), 2);
        assert_eq!(archive.root.find_int32("count", 1), Some(8));
        assert_eq!(archive.root.find_bool("extra", 0), Some(true));
    }

    #[test]
    fn import_contents_conflict_leaves_document_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "a.kam", &sample());

        let mut other = ArchiveMessage::new();
        // would merge cleanly, but the conflicting field must abort everything
        other.add("extra", FieldValue::Bool(true)).unwrap();
        other.add("count", FieldValue::String("nope".into())).unwrap();
        let other_path = write_sample(dir.path(), "b.kam", &other);

        let mut archive = LoadedArchive::load_path(&path).unwrap();
        let before = archive.root.clone();
        assert!(
            archive
                .import_from_path(&other_path, &ImportMode::Contents)
                .is_err()
        );
        assert_eq!(archive.root, before);
        assert!(!archive.dirty);
    }
}
