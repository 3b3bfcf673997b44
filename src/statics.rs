// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs to reduce duplication and make tweaks safer.

use crate::value::fourcc;

// External links
pub const GITHUB_URL: &str = "https://github.com/staehle/kasten";

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "Kasten: Archive Message Editor";

pub const EN_MENU_FILE: &str = "File";
pub const EN_MENU_EDIT: &str = "Edit";
pub const EN_MENU_MESSAGE: &str = "Message";
pub const EN_MENU_VIEW: &str = "View";
pub const EN_MENU_HELP: &str = "Help";

pub const EN_ITEM_OPEN: &str = "Open...";
pub const EN_ITEM_RELOAD: &str = "Reload from disk";
pub const EN_ITEM_SAVE: &str = "Save";
pub const EN_ITEM_SAVE_AS: &str = "Save As...";
pub const EN_ITEM_CLOSE: &str = "Close";
pub const EN_ITEM_QUIT: &str = "Quit";

pub const EN_ITEM_ADD_VALUE: &str = "Add";
pub const EN_ITEM_IMPORT: &str = "Import message file...";

pub const EN_ITEM_SET_WHAT: &str = "Set message type...";
pub const EN_ITEM_MAKE_EMPTY: &str = "Remove all fields";
pub const EN_ITEM_INFORMATION: &str = "Information...";

pub const EN_ITEM_DATA_PANEL: &str = "Data panel";
pub const EN_ITEM_ABOUT: &str = "About";

pub const EN_WINDOW_EDITOR: &str = "Edit value";
pub const EN_WINDOW_NEW_VALUE: &str = "Add value";
pub const EN_WINDOW_IMPORT: &str = "Import message file";
pub const EN_WINDOW_WHAT: &str = "Edit message type";
pub const EN_WINDOW_INFO: &str = "Message information";
pub const EN_WINDOW_VISUAL: &str = "Visual editor";
pub const EN_WINDOW_ABOUT: &str = "About";
pub const EN_WINDOW_CONFIRM: &str = "Please confirm";

pub const EN_HOME_HEADING: &str = "Kasten: Archive Message Editor";
pub const EN_HOME_INSTRUCTIONS: &str = "Open a flattened archive message (.kam) to begin.";

pub const EN_ABOUT_HEADING: &str = "Kasten: Archive Message Editor";
pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_PROJECT_REPO: &str = "GitHub Repo";

pub const EN_COL_INDEX: &str = "Index";
pub const EN_COL_VALUE: &str = "Value";

pub const EN_BTN_SAVE: &str = "Save";
pub const EN_BTN_CANCEL: &str = "Cancel";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BTN_DELETE: &str = "Delete";
pub const EN_BTN_EDIT: &str = "Edit";
pub const EN_BTN_IMPORT: &str = "Import";
pub const EN_BTN_VISUAL: &str = "Visual...";
pub const EN_BTN_KEEP: &str = "Keep current";
pub const EN_BTN_RELOAD: &str = "Reload";
pub const EN_BTN_DISCARD: &str = "Discard changes";

pub const EN_LABEL_FIELD_NAME: &str = "Field name:";
pub const EN_LABEL_VALUE: &str = "Value:";
pub const EN_LABEL_DATE: &str = "Date (d/m/y):";
pub const EN_LABEL_CLOCK: &str = "Time (h:m:s):";
pub const EN_LABEL_PREDEFINED: &str = "Use a predefined value:";
pub const EN_LABEL_CUSTOM: &str = "Use a custom value:";
pub const EN_LABEL_IMPORT_MODE: &str = "Import as:";
pub const EN_RADIO_IMPORT_MEMBER: &str = "A nested message member";
pub const EN_RADIO_IMPORT_CONTENTS: &str = "Its fields, merged into this message";
pub const EN_HINT_MEMBER_NAME: &str = "member field name";

pub const EN_INFO_WHAT: &str = "Message type ('what'):";
pub const EN_INFO_FIELDS: &str = "Fields:";
pub const EN_INFO_FLAT_SIZE: &str = "Flattened size (bytes):";

pub const EN_CONFIRM_UNSAVED: &str =
    "This message has unsaved changes. Discard them?";
pub const EN_CONFIRM_RELOAD: &str =
    "The file was changed on disk. Reload and lose in-memory edits?";

pub const EN_UNSUPPORTED_EDIT: &str = "This value type has no editor.";
pub const EN_SELECT_FIELD: &str = "Select a field to see its values.";
pub const EN_EMPTY_MESSAGE: &str = "This message has no fields.";

pub const EN_STATUS_LOADED: &str = "Loaded";
pub const EN_STATUS_SAVED: &str = "Saved";
pub const EN_STATUS_IMPORTED: &str = "Imported";
pub const EN_STATUS_RELOADED: &str = "Reloaded from disk";

pub const EN_BADGE_DIRTY: &str = "*";
pub const EN_PLACEHOLDER_UNSAVED: &str = "<unsaved>";

// File dialog filter.
pub const EN_FILTER_ARCHIVE: &str = "Archive message";
pub const ARCHIVE_EXTENSIONS: &[&str] = &["kam"];

// Predefined message-type constants offered by the set-type window,
// mirroring the command codes commonly found in archived messages.
pub const PREDEFINED_WHATS: &[(&str, u32)] = &[
    ("Set property", fourcc(b"PSET")),
    ("Get property", fourcc(b"PGET")),
    ("Create property", fourcc(b"PCRT")),
    ("Delete property", fourcc(b"PDEL")),
    ("Count properties", fourcc(b"PCNT")),
    ("Execute property", fourcc(b"PEXE")),
    ("Undo", fourcc(b"UNDO")),
    ("Redo", fourcc(b"REDO")),
    ("Cut", fourcc(b"CCUT")),
    ("Copy", fourcc(b"COPY")),
    ("Paste", fourcc(b"PSTE")),
    ("Select all", fourcc(b"SALL")),
    ("Save requested", fourcc(b"SAVE")),
    ("No reply", fourcc(b"NONE")),
    ("Reply", fourcc(b"RPLY")),
    ("Simple data", fourcc(b"DATA")),
    ("MIME data", fourcc(b"MIME")),
    ("Archived object", fourcc(b"ARCV")),
];
