use crate::message::{ArchiveMessage, FieldInfo, MessageError};
use crate::value::{FieldValue, TypeCode};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("row index {index} out of range ({count} fields)")]
    RowOutOfRange { index: i32, count: usize },
    #[error("member index missing for multi-value message field {name:?}")]
    MemberIndexMissing { name: String },
    #[error("member index {index} out of range for field {name:?} ({count} values)")]
    MemberOutOfRange {
        name: String,
        index: i32,
        count: usize,
    },
    #[error("{0} unconsumed path elements after reaching a leaf")]
    TrailingPath(usize),
    #[error(transparent)]
    Commit(#[from] MessageError),
}

/// One nested-message ancestor recorded while descending a selection path.
/// The chain is ordered outermost first; `message` is an owned copy of the
/// member at (field_name, member_index) in its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub field_name: String,
    pub member_index: usize,
    pub message: ArchiveMessage,
}

/// Result of resolving a selection path: the ancestor chain plus the leaf
/// field the path ends on. An empty path selects the root itself
/// (empty chain, no leaf).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTarget {
    pub chain: Vec<ChainLink>,
    pub leaf: Option<FieldInfo>,
}

impl SelectionTarget {
    /// The message the leaf field lives in: the innermost chain copy, or the
    /// root when the chain is empty.
    pub fn scope<'a>(&'a self, root: &'a ArchiveMessage) -> &'a ArchiveMessage {
        self.chain.last().map_or(root, |link| &link.message)
    }
}

/// Walk a selection path down from `root`. The path is ordered leaf first,
/// outermost element last, and is consumed back to front: each element is a
/// field row index, with one extra element for the member index whenever a
/// message field holds more than one value.
pub fn resolve_selection(
    root: &ArchiveMessage,
    path: &[i32],
) -> Result<SelectionTarget, SelectionError> {
    let mut chain: Vec<ChainLink> = Vec::new();
    let mut cursor = path.len();
    let mut leaf = None;

    while cursor > 0 {
        cursor -= 1;
        let row = path[cursor];
        let link = {
            let scope = chain.last().map_or(root, |link| &link.message);
            let count = scope.count_names();
            let index = usize::try_from(row)
                .ok()
                .filter(|i| *i < count)
                .ok_or(SelectionError::RowOutOfRange { index: row, count })?;
            // scope guarantees the info exists at a checked index
            let Some(info) = scope.field_info(index) else {
                return Err(SelectionError::RowOutOfRange { index: row, count });
            };
            if info.type_code != TypeCode::Message {
                if cursor > 0 {
                    return Err(SelectionError::TrailingPath(cursor));
                }
                leaf = Some(info);
                None
            } else {
                let member_index = if info.count > 1 {
                    if cursor == 0 {
                        return Err(SelectionError::MemberIndexMissing { name: info.name });
                    }
                    cursor -= 1;
                    let raw = path[cursor];
                    usize::try_from(raw).ok().filter(|i| *i < info.count).ok_or(
                        SelectionError::MemberOutOfRange {
                            name: info.name.clone(),
                            index: raw,
                            count: info.count,
                        },
                    )?
                } else {
                    0
                };
                let Some(member) = scope.find_message(&info.name, member_index) else {
                    return Err(SelectionError::MemberOutOfRange {
                        name: info.name,
                        index: member_index as i32,
                        count: info.count,
                    });
                };
                Some(ChainLink {
                    field_name: info.name,
                    member_index,
                    message: member.clone(),
                })
            }
        };
        match link {
            Some(link) => chain.push(link),
            None => break,
        }
    }

    Ok(SelectionTarget { chain, leaf })
}

/// Fold an edit chain back into the root: replace each link's member in its
/// parent copy from the inside out, then replace the outermost member in the
/// root. Everything up to the final replace happens on copies, so a failure
/// leaves the root untouched.
pub fn commit_chain(
    root: &mut ArchiveMessage,
    mut chain: Vec<ChainLink>,
) -> Result<(), MessageError> {
    while let Some(inner) = chain.pop() {
        match chain.last_mut() {
            Some(parent) => parent.message.replace(
                &inner.field_name,
                inner.member_index,
                FieldValue::Message(inner.message),
            )?,
            None => root.replace(
                &inner.field_name,
                inner.member_index,
                FieldValue::Message(inner.message),
            )?,
        }
    }
    Ok(())
}
