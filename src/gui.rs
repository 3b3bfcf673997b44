use crate::editors::{EditorBuffer, EditorState};
use crate::selection::{SelectionTarget, commit_chain, resolve_selection};
use crate::statics;
use crate::value::{HorizontalAlignment, TypeCode, VerticalAlignment};
use crate::{ArchiveMessage, ImportMode, LoadedArchive};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const DISK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Types offered by the Add submenu, in menu order. Raw blobs and nested
/// messages have no editor; messages come in through the importer instead.
const ADDABLE_TYPES: [TypeCode; 21] = [
    TypeCode::Bool,
    TypeCode::Int8,
    TypeCode::Int16,
    TypeCode::Int32,
    TypeCode::Int64,
    TypeCode::UInt8,
    TypeCode::UInt16,
    TypeCode::UInt32,
    TypeCode::UInt64,
    TypeCode::Float,
    TypeCode::Double,
    TypeCode::String,
    TypeCode::Point,
    TypeCode::Rect,
    TypeCode::Size,
    TypeCode::Color,
    TypeCode::Alignment,
    TypeCode::AffineTransform,
    TypeCode::Time,
    TypeCode::EntryRef,
    TypeCode::NodeRef,
];

pub fn run_gui(path: Option<PathBuf>) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            let mut app = KastenApp {
                show_data_panel: true,
                ..Default::default()
            };
            if let Some(path) = path {
                app.load_archive(&path);
            }
            Ok(Box::new(app))
        }),
    )
}

/// Actions deferred behind the unsaved-changes confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingAction {
    Open,
    Close,
    Reload,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisualDrag {
    Move,
    Resize,
}

/// The main application state and GUI logic. Owns the loaded archive, the
/// current tree selection, and the buffers of every open dialog.
#[derive(Default)]
struct KastenApp {
    archive: Option<LoadedArchive>,
    dialog_dir: Option<PathBuf>,
    status: String,
    last_error: Option<String>,

    // Tree selection: path in resolver order (leaf first, outermost last).
    selected_path: Option<Vec<i32>>,
    show_data_panel: bool,

    // Value editor. `editor_path` is the selection the editor was opened on.
    editor: Option<EditorState>,
    editor_path: Vec<i32>,

    // Visual point/size/rect editor (operates on the open value editor).
    visual_open: bool,
    visual_drag: Option<VisualDrag>,

    // Importer window.
    import_path: Option<PathBuf>,
    import_as_member: bool,
    import_member_name: String,

    // Set-type window.
    what_open: bool,
    what_use_predefined: bool,
    what_predefined_index: usize,
    what_custom_text: String,

    info_open: bool,
    about_open: bool,

    // Confirmation dialogs.
    confirm_unsaved: Option<PendingAction>,
    confirm_reload_open: bool,
    allow_quit: bool,

    last_poll: Option<Instant>,
    last_title: String,
}

impl KastenApp {
    fn file_dialog(&self) -> rfd::FileDialog {
        let mut dlg = rfd::FileDialog::new()
            .add_filter(statics::EN_FILTER_ARCHIVE, statics::ARCHIVE_EXTENSIONS);
        if let Some(dir) = self.dialog_dir.clone() {
            dlg = dlg.set_directory(dir);
        }
        dlg
    }

    fn load_archive(&mut self, path: &Path) {
        match LoadedArchive::load_path(path) {
            Ok(archive) => {
                self.dialog_dir = path.parent().map(PathBuf::from);
                self.status = format!("{} {}", statics::EN_STATUS_LOADED, path.display());
                self.archive = Some(archive);
                self.last_error = None;
                self.reset_view_state();
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to load: {e:#}"));
            }
        }
    }

    fn reset_view_state(&mut self) {
        self.selected_path = None;
        self.editor = None;
        self.editor_path.clear();
        self.visual_open = false;
        self.visual_drag = None;
        self.import_path = None;
        self.what_open = false;
        self.info_open = false;
        self.confirm_unsaved = None;
        self.confirm_reload_open = false;
    }

    /// Run an action now, or park it behind the unsaved-changes prompt.
    fn request(&mut self, ctx: &egui::Context, action: PendingAction) {
        let dirty = self.archive.as_ref().is_some_and(|a| a.dirty);
        if dirty {
            self.confirm_unsaved = Some(action);
        } else {
            self.perform(ctx, action);
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: PendingAction) {
        match action {
            PendingAction::Open => {
                if let Some(path) = self.file_dialog().pick_file() {
                    self.load_archive(&path);
                }
            }
            PendingAction::Close => {
                self.archive = None;
                self.reset_view_state();
                self.status.clear();
            }
            PendingAction::Reload => self.reload_file(),
            PendingAction::Quit => {
                self.allow_quit = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn save_file(&mut self) {
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        let path = archive.source_path.clone();
        if let Err(e) = archive.save_to_path(&path) {
            self.last_error = Some(format!("Failed to save: {e:#}"));
        } else {
            self.status = format!("{} {}", statics::EN_STATUS_SAVED, path.display());
            self.last_error = None;
        }
    }

    fn save_file_as(&mut self) {
        let mut dlg = self.file_dialog();
        if let Some(archive) = self.archive.as_ref()
            && let Some(file_name) = archive.source_path.file_name()
        {
            dlg = dlg.set_file_name(file_name.to_string_lossy());
        }
        let Some(path) = dlg.save_file() else {
            return;
        };
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        if let Err(e) = archive.save_to_path(&path) {
            self.last_error = Some(format!("Failed to save: {e:#}"));
        } else {
            self.dialog_dir = path.parent().map(PathBuf::from);
            self.status = format!("{} {}", statics::EN_STATUS_SAVED, path.display());
            self.last_error = None;
        }
    }

    fn reload_file(&mut self) {
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        if let Err(e) = archive.reload() {
            self.last_error = Some(format!("Failed to reload: {e:#}"));
        } else {
            self.status = statics::EN_STATUS_RELOADED.to_string();
            self.last_error = None;
            self.selected_path = None;
            self.editor = None;
        }
    }

    fn poll_disk(&mut self) {
        if self.confirm_reload_open {
            return;
        }
        if self
            .last_poll
            .is_some_and(|t| t.elapsed() < DISK_POLL_INTERVAL)
        {
            return;
        }
        self.last_poll = Some(Instant::now());
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        match archive.external_change() {
            Ok(true) => self.confirm_reload_open = true,
            Ok(false) => {}
            Err(e) => self.last_error = Some(format!("Watching file: {e:#}")),
        }
    }

    /// Apply a finished editor through the edit chain and back into the root.
    /// Any failure leaves the document untouched and keeps the editor open.
    fn apply_editor(&mut self) -> bool {
        let Some(editor) = self.editor.clone() else {
            return true;
        };
        let Some(archive) = self.archive.as_mut() else {
            return true;
        };
        let result = (|| -> anyhow::Result<()> {
            let target = resolve_selection(&archive.root, &self.editor_path)?;
            let mut chain = target.chain;
            match chain.last_mut() {
                Some(link) => editor.apply(&mut link.message)?,
                None => editor.apply(&mut archive.root)?,
            }
            commit_chain(&mut archive.root, chain)?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                archive.mark_dirty();
                self.last_error = None;
                true
            }
            Err(e) => {
                self.last_error = Some(format!("Edit failed: {e:#}"));
                false
            }
        }
    }

    /// Delete one value of the currently selected field.
    fn delete_value(&mut self, index: usize) {
        let Some(path) = self.selected_path.clone() else {
            return;
        };
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        let result = (|| -> anyhow::Result<()> {
            let target = resolve_selection(&archive.root, &path)?;
            let Some(leaf) = target.leaf.clone() else {
                return Ok(());
            };
            let mut chain = target.chain;
            match chain.last_mut() {
                Some(link) => link.message.remove_value(&leaf.name, index)?,
                None => archive.root.remove_value(&leaf.name, index)?,
            }
            commit_chain(&mut archive.root, chain)?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                archive.mark_dirty();
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(format!("Delete failed: {e:#}")),
        }
    }

    fn open_value_editor_at(&mut self, path: &[i32], index: usize) {
        let Some(archive) = self.archive.as_ref() else {
            return;
        };
        match resolve_selection(&archive.root, path) {
            Ok(target) => {
                let Some(leaf) = target.leaf.clone() else {
                    return;
                };
                let scope = target.scope(&archive.root);
                let Some(value) = scope.find(&leaf.name, index) else {
                    return;
                };
                self.editor = Some(EditorState::for_value(&leaf.name, index, value));
                self.editor_path = path.to_vec();
                self.visual_open = false;
            }
            Err(e) => self.last_error = Some(format!("Selection failed: {e:#}")),
        }
    }

    fn open_create_editor(&mut self, code: TypeCode) {
        // new values land in the message scope of the current selection
        self.editor = Some(EditorState::for_new(code));
        self.editor_path = self.selected_path.clone().unwrap_or_default();
        self.visual_open = false;
    }

    fn start_import(&mut self) {
        let Some(path) = self.file_dialog().pick_file() else {
            return;
        };
        self.import_as_member = true;
        self.import_member_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.import_path = Some(path);
    }

    fn run_import(&mut self) {
        let Some(path) = self.import_path.take() else {
            return;
        };
        let Some(archive) = self.archive.as_mut() else {
            return;
        };
        let mode = if self.import_as_member {
            ImportMode::Member {
                name: self.import_member_name.trim().to_string(),
            }
        } else {
            ImportMode::Contents
        };
        if let Err(e) = archive.import_from_path(&path, &mode) {
            self.last_error = Some(format!("Import failed: {e:#}"));
        } else {
            self.status = format!("{} {}", statics::EN_STATUS_IMPORTED, path.display());
            self.last_error = None;
        }
    }

    fn open_what_window(&mut self) {
        let Some(archive) = self.archive.as_ref() else {
            return;
        };
        let what = archive.root.what();
        let predefined = statics::PREDEFINED_WHATS
            .iter()
            .position(|(_, v)| *v == what);
        self.what_use_predefined = predefined.is_some();
        self.what_predefined_index = predefined.unwrap_or(0);
        self.what_custom_text = what.to_string();
        self.what_open = true;
    }

    fn window_title(&self) -> String {
        match self.archive.as_ref() {
            Some(archive) => {
                let dirty = if archive.dirty {
                    statics::EN_BADGE_DIRTY
                } else {
                    ""
                };
                format!(
                    "{}{} - {}",
                    archive.source_path.display(),
                    dirty,
                    statics::EN_APP_TITLE
                )
            }
            None => statics::EN_APP_TITLE.to_string(),
        }
    }

    /// Render one nesting level of the message tree. `prefix` accumulates
    /// path elements in resolver consumption order (outermost first); a row
    /// click reverses it into the leaf-first selection path.
    fn render_tree_level(
        ui: &mut egui::Ui,
        msg: &ArchiveMessage,
        prefix: &mut Vec<i32>,
        selected: &Option<Vec<i32>>,
        clicked: &mut Option<Vec<i32>>,
    ) {
        for row in 0..msg.count_names() {
            let Some(info) = msg.field_info(row) else {
                continue;
            };
            if info.type_code == TypeCode::Message {
                let header = format!("{} ({} entries)", info.name, info.count);
                if info.count > 1 {
                    egui::CollapsingHeader::new(header)
                        .id_salt((prefix.len(), row, "multi"))
                        .show(ui, |ui| {
                            for member in 0..info.count {
                                let Some(child) = msg.find_message(&info.name, member) else {
                                    continue;
                                };
                                egui::CollapsingHeader::new(format!(
                                    "{} [{member}]",
                                    info.name
                                ))
                                .id_salt((prefix.len(), row, member))
                                .show(ui, |ui| {
                                    prefix.push(row as i32);
                                    prefix.push(member as i32);
                                    Self::render_tree_level(ui, child, prefix, selected, clicked);
                                    prefix.pop();
                                    prefix.pop();
                                });
                            }
                        });
                } else if let Some(child) = msg.find_message(&info.name, 0) {
                    egui::CollapsingHeader::new(header)
                        .id_salt((prefix.len(), row))
                        .show(ui, |ui| {
                            prefix.push(row as i32);
                            Self::render_tree_level(ui, child, prefix, selected, clicked);
                            prefix.pop();
                        });
                }
            } else {
                let preview = if info.count == 1 {
                    msg.find(&info.name, 0).map(|v| v.preview()).unwrap_or_default()
                } else {
                    format!("{} values", info.count)
                };
                let label = format!(
                    "{}  [{}]  {}",
                    info.name,
                    info.type_code.type_name(),
                    preview
                );
                let mut path: Vec<i32> = prefix.clone();
                path.push(row as i32);
                path.reverse();
                let is_selected = selected.as_deref() == Some(path.as_slice());
                if ui.selectable_label(is_selected, label).clicked() {
                    *clicked = Some(path);
                }
            }
        }
    }

    fn render_editor_widgets(ui: &mut egui::Ui, editor: &mut EditorState) {
        if editor.creating {
            ui.horizontal(|ui| {
                ui.label(statics::EN_LABEL_FIELD_NAME);
                ui.text_edit_singleline(&mut editor.name);
            });
        } else {
            ui.label(format!(
                "{} [{}] @ {}",
                editor.name,
                editor.type_code().type_name(),
                editor.index
            ));
        }
        ui.separator();

        match &mut editor.buffer {
            EditorBuffer::Bool(v) => {
                ui.checkbox(v, statics::EN_LABEL_VALUE);
            }
            EditorBuffer::Integer { text, .. } => {
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_VALUE);
                    ui.text_edit_singleline(text);
                });
            }
            EditorBuffer::Float(v) => {
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_VALUE);
                    ui.add(egui::DragValue::new(v).speed(0.1));
                });
            }
            EditorBuffer::Double(v) => {
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_VALUE);
                    ui.add(egui::DragValue::new(v).speed(0.1));
                });
            }
            EditorBuffer::Text(s) => {
                ui.text_edit_multiline(s);
            }
            EditorBuffer::Point { x, y } => {
                ui.horizontal(|ui| {
                    ui.label("x:");
                    ui.add(egui::DragValue::new(x).speed(0.5));
                    ui.label("y:");
                    ui.add(egui::DragValue::new(y).speed(0.5));
                });
            }
            EditorBuffer::Rect {
                left,
                top,
                right,
                bottom,
            } => {
                ui.horizontal(|ui| {
                    ui.label("left:");
                    ui.add(egui::DragValue::new(left).speed(0.5));
                    ui.label("top:");
                    ui.add(egui::DragValue::new(top).speed(0.5));
                });
                ui.horizontal(|ui| {
                    ui.label("right:");
                    ui.add(egui::DragValue::new(right).speed(0.5));
                    ui.label("bottom:");
                    ui.add(egui::DragValue::new(bottom).speed(0.5));
                });
            }
            EditorBuffer::Size { width, height } => {
                ui.horizontal(|ui| {
                    ui.label("width:");
                    ui.add(egui::DragValue::new(width).speed(0.5));
                    ui.label("height:");
                    ui.add(egui::DragValue::new(height).speed(0.5));
                });
            }
            EditorBuffer::Color(c) => {
                ui.horizontal(|ui| {
                    ui.label("r:");
                    ui.add(egui::DragValue::new(&mut c.red));
                    ui.label("g:");
                    ui.add(egui::DragValue::new(&mut c.green));
                    ui.label("b:");
                    ui.add(egui::DragValue::new(&mut c.blue));
                    ui.label("a:");
                    ui.add(egui::DragValue::new(&mut c.alpha));
                });
                let swatch = egui::Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, c.alpha);
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(64.0, 20.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, egui::CornerRadius::same(2), swatch);
            }
            EditorBuffer::Alignment {
                horizontal,
                vertical,
            } => {
                egui::ComboBox::from_label("horizontal")
                    .selected_text(horizontal.label())
                    .show_ui(ui, |ui| {
                        for h in HorizontalAlignment::ALL {
                            ui.selectable_value(horizontal, h, h.label());
                        }
                    });
                egui::ComboBox::from_label("vertical")
                    .selected_text(vertical.label())
                    .show_ui(ui, |ui| {
                        for v in VerticalAlignment::ALL {
                            ui.selectable_value(vertical, v, v.label());
                        }
                    });
            }
            EditorBuffer::Affine(t) => {
                ui.horizontal(|ui| {
                    ui.label("sx:");
                    ui.add(egui::DragValue::new(&mut t.sx).speed(0.05));
                    ui.label("sy:");
                    ui.add(egui::DragValue::new(&mut t.sy).speed(0.05));
                });
                ui.horizontal(|ui| {
                    ui.label("shx:");
                    ui.add(egui::DragValue::new(&mut t.shx).speed(0.05));
                    ui.label("shy:");
                    ui.add(egui::DragValue::new(&mut t.shy).speed(0.05));
                });
                ui.horizontal(|ui| {
                    ui.label("tx:");
                    ui.add(egui::DragValue::new(&mut t.tx).speed(0.5));
                    ui.label("ty:");
                    ui.add(egui::DragValue::new(&mut t.ty).speed(0.5));
                });
            }
            EditorBuffer::Time {
                day,
                month,
                year_text,
                hour,
                minute,
                second,
            } => {
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_DATE);
                    ui.add(egui::DragValue::new(day).range(1..=31));
                    ui.add(egui::DragValue::new(month).range(1..=12));
                    ui.add(
                        egui::TextEdit::singleline(year_text).desired_width(60.0),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_CLOCK);
                    ui.add(egui::DragValue::new(hour).range(0..=23));
                    ui.add(egui::DragValue::new(minute).range(0..=59));
                    ui.add(egui::DragValue::new(second).range(0..=59));
                });
            }
            EditorBuffer::EntryRef {
                device_text,
                directory_text,
                name,
            } => {
                ui.horizontal(|ui| {
                    ui.label("device:");
                    ui.text_edit_singleline(device_text);
                });
                ui.horizontal(|ui| {
                    ui.label("directory:");
                    ui.text_edit_singleline(directory_text);
                });
                ui.horizontal(|ui| {
                    ui.label("name:");
                    ui.text_edit_singleline(name);
                });
            }
            EditorBuffer::NodeRef {
                device_text,
                node_text,
            } => {
                ui.horizontal(|ui| {
                    ui.label("device:");
                    ui.text_edit_singleline(device_text);
                });
                ui.horizontal(|ui| {
                    ui.label("node:");
                    ui.text_edit_singleline(node_text);
                });
            }
            EditorBuffer::Unsupported(_) => {
                ui.label(statics::EN_UNSUPPORTED_EDIT);
            }
        }
    }

    /// Canvas for point/size/rect values. Dragging the body moves, dragging
    /// near the bottom-right corner resizes.
    fn render_visual_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let (response, painter) =
            ui.allocate_painter(egui::Vec2::splat(260.0), egui::Sense::click_and_drag());
        let area = response.rect.shrink(10.0);
        painter.rect_stroke(
            response.rect,
            egui::CornerRadius::ZERO,
            egui::Stroke::new(1.0, egui::Color32::GRAY),
            egui::StrokeKind::Inside,
        );
        let origin = area.left_top();
        let delta = response.drag_delta();

        match &mut editor.buffer {
            EditorBuffer::Point { x, y } => {
                if response.dragged()
                    && let Some(pos) = response.interact_pointer_pos()
                {
                    *x = (pos.x - origin.x).max(0.0);
                    *y = (pos.y - origin.y).max(0.0);
                }
                let center = origin + egui::vec2(*x, *y);
                painter.circle_filled(center, 4.0, egui::Color32::LIGHT_BLUE);
            }
            EditorBuffer::Size { width, height } => {
                if response.dragged() {
                    *width = (*width + delta.x).max(0.0);
                    *height = (*height + delta.y).max(0.0);
                }
                let rect = egui::Rect::from_min_size(origin, egui::vec2(*width, *height));
                painter.rect_stroke(
                    rect,
                    egui::CornerRadius::ZERO,
                    egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
                    egui::StrokeKind::Inside,
                );
            }
            EditorBuffer::Rect {
                left,
                top,
                right,
                bottom,
            } => {
                let rect = egui::Rect::from_min_max(
                    origin + egui::vec2(*left, *top),
                    origin + egui::vec2(*right, *bottom),
                );
                if response.drag_started() {
                    let near_corner = response
                        .interact_pointer_pos()
                        .is_some_and(|pos| pos.distance(rect.right_bottom()) < 12.0);
                    self.visual_drag = Some(if near_corner {
                        VisualDrag::Resize
                    } else {
                        VisualDrag::Move
                    });
                }
                if response.drag_stopped() {
                    self.visual_drag = None;
                }
                if response.dragged() {
                    match self.visual_drag {
                        Some(VisualDrag::Resize) => {
                            *right = (*right + delta.x).max(*left);
                            *bottom = (*bottom + delta.y).max(*top);
                        }
                        _ => {
                            *left += delta.x;
                            *top += delta.y;
                            *right += delta.x;
                            *bottom += delta.y;
                        }
                    }
                }
                let rect = egui::Rect::from_min_max(
                    origin + egui::vec2(*left, *top),
                    origin + egui::vec2(*right, *bottom),
                );
                painter.rect_stroke(
                    rect,
                    egui::CornerRadius::ZERO,
                    egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
                    egui::StrokeKind::Inside,
                );
                painter.circle_filled(rect.right_bottom(), 4.0, egui::Color32::LIGHT_RED);
            }
            _ => {
                ui.label(statics::EN_UNSUPPORTED_EDIT);
            }
        }
    }
}

impl eframe::App for KastenApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_disk();
        ctx.request_repaint_after(DISK_POLL_INTERVAL);

        // Intercept the window-close button while there are unsaved changes.
        if ctx.input(|i| i.viewport().close_requested())
            && !self.allow_quit
            && self.archive.as_ref().is_some_and(|a| a.dirty)
        {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.confirm_unsaved = Some(PendingAction::Quit);
        }

        let title = self.window_title();
        if title != self.last_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.last_title = title;
        }

        let has_archive = self.archive.is_some();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button(statics::EN_MENU_FILE, |ui| {
                    if ui.button(statics::EN_ITEM_OPEN).clicked() {
                        ui.close();
                        self.request(ctx, PendingAction::Open);
                    }
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_RELOAD))
                        .clicked()
                    {
                        ui.close();
                        self.request(ctx, PendingAction::Reload);
                    }
                    ui.separator();
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_SAVE))
                        .clicked()
                    {
                        ui.close();
                        self.save_file();
                    }
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_SAVE_AS))
                        .clicked()
                    {
                        ui.close();
                        self.save_file_as();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_CLOSE))
                        .clicked()
                    {
                        ui.close();
                        self.request(ctx, PendingAction::Close);
                    }
                    if ui.button(statics::EN_ITEM_QUIT).clicked() {
                        ui.close();
                        self.request(ctx, PendingAction::Quit);
                    }
                });
                ui.menu_button(statics::EN_MENU_EDIT, |ui| {
                    ui.menu_button(statics::EN_ITEM_ADD_VALUE, |ui| {
                        for code in ADDABLE_TYPES {
                            if ui
                                .add_enabled(
                                    has_archive,
                                    egui::Button::new(code.type_name()),
                                )
                                .clicked()
                            {
                                ui.close();
                                self.open_create_editor(code);
                            }
                        }
                    });
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_IMPORT))
                        .clicked()
                    {
                        ui.close();
                        self.start_import();
                    }
                });
                ui.menu_button(statics::EN_MENU_MESSAGE, |ui| {
                    if ui
                        .add_enabled(has_archive, egui::Button::new(statics::EN_ITEM_SET_WHAT))
                        .clicked()
                    {
                        ui.close();
                        self.open_what_window();
                    }
                    if ui
                        .add_enabled(
                            has_archive,
                            egui::Button::new(statics::EN_ITEM_MAKE_EMPTY),
                        )
                        .clicked()
                    {
                        ui.close();
                        if let Some(archive) = self.archive.as_mut() {
                            archive.root.make_empty();
                            archive.mark_dirty();
                            self.selected_path = None;
                        }
                    }
                    ui.separator();
                    if ui
                        .add_enabled(
                            has_archive,
                            egui::Button::new(statics::EN_ITEM_INFORMATION),
                        )
                        .clicked()
                    {
                        ui.close();
                        self.info_open = true;
                    }
                });
                ui.menu_button(statics::EN_MENU_VIEW, |ui| {
                    ui.checkbox(&mut self.show_data_panel, statics::EN_ITEM_DATA_PANEL);
                });
                ui.menu_button(statics::EN_MENU_HELP, |ui| {
                    if ui.button(statics::EN_ITEM_ABOUT).clicked() {
                        ui.close();
                        self.about_open = true;
                    }
                });

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        self.render_dialogs(ctx);

        if self.archive.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(statics::EN_HOME_HEADING);
                ui.label(statics::EN_HOME_INSTRUCTIONS);
            });
            return;
        }

        egui::TopBottomPanel::bottom("bottom_status").show(ctx, |ui| {
            ui.horizontal(|ui| match self.archive.as_ref() {
                Some(archive) => {
                    ui.label(archive.source_path.display().to_string());
                    if archive.dirty {
                        ui.label(statics::EN_BADGE_DIRTY);
                    }
                    ui.separator();
                    ui.label(format!("what: {}", format_what(archive.root.what())));
                }
                None => {
                    ui.label(statics::EN_PLACEHOLDER_UNSAVED);
                }
            });
        });

        if self.show_data_panel {
            self.render_data_panel(ctx);
        }

        let mut clicked = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(archive) = self.archive.as_ref() else {
                return;
            };
            if archive.root.is_empty() {
                ui.label(statics::EN_EMPTY_MESSAGE);
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                let mut prefix = Vec::new();
                Self::render_tree_level(
                    ui,
                    &archive.root,
                    &mut prefix,
                    &self.selected_path,
                    &mut clicked,
                );
            });
        });
        if let Some(path) = clicked {
            self.selected_path = Some(path);
        }
    }
}

impl KastenApp {
    fn render_dialogs(&mut self, ctx: &egui::Context) {
        self.render_editor_window(ctx);
        self.render_import_window(ctx);
        self.render_what_window(ctx);
        self.render_info_window(ctx);
        self.render_confirm_windows(ctx);

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_ABOUT_HEADING);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.hyperlink_to(
                        format!("{} @ {}", statics::EN_PROJECT_REPO, statics::GITHUB_URL),
                        statics::GITHUB_URL,
                    );
                });
            self.about_open = open;
        }
    }

    fn render_editor_window(&mut self, ctx: &egui::Context) {
        if self.editor.is_none() {
            return;
        }
        let creating = self.editor.as_ref().is_some_and(|e| e.creating);
        let title = if creating {
            statics::EN_WINDOW_NEW_VALUE
        } else {
            statics::EN_WINDOW_EDITOR
        };

        let mut save_clicked = false;
        let mut cancel_clicked = false;
        let mut visual_clicked = false;
        egui::Window::new(title)
            .collapsible(false)
            .show(ctx, |ui| {
                let Some(editor) = self.editor.as_mut() else {
                    return;
                };
                editor.clamp();
                Self::render_editor_widgets(ui, editor);
                ui.separator();
                ui.horizontal(|ui| {
                    let supported = editor.is_supported();
                    if ui
                        .add_enabled(supported, egui::Button::new(statics::EN_BTN_SAVE))
                        .clicked()
                    {
                        save_clicked = true;
                    }
                    if ui.button(statics::EN_BTN_CANCEL).clicked() {
                        cancel_clicked = true;
                    }
                    let visual = matches!(
                        editor.buffer,
                        EditorBuffer::Point { .. }
                            | EditorBuffer::Rect { .. }
                            | EditorBuffer::Size { .. }
                    );
                    if visual && ui.button(statics::EN_BTN_VISUAL).clicked() {
                        visual_clicked = true;
                    }
                });
            });

        if visual_clicked {
            self.visual_open = true;
        }
        if self.visual_open {
            let mut open = true;
            egui::Window::new(statics::EN_WINDOW_VISUAL)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    self.render_visual_canvas(ui);
                });
            self.visual_open = open;
        }
        if save_clicked && self.apply_editor() {
            self.editor = None;
            self.visual_open = false;
        }
        if cancel_clicked {
            // cancel never touches the document
            self.editor = None;
            self.visual_open = false;
        }
    }

    fn render_import_window(&mut self, ctx: &egui::Context) {
        if self.import_path.is_none() {
            return;
        }
        let mut import_clicked = false;
        let mut cancel_clicked = false;
        egui::Window::new(statics::EN_WINDOW_IMPORT)
            .collapsible(false)
            .show(ctx, |ui| {
                if let Some(path) = self.import_path.as_ref() {
                    ui.label(path.display().to_string());
                }
                ui.separator();
                ui.label(statics::EN_LABEL_IMPORT_MODE);
                ui.radio_value(
                    &mut self.import_as_member,
                    true,
                    statics::EN_RADIO_IMPORT_MEMBER,
                );
                if self.import_as_member {
                    ui.horizontal(|ui| {
                        ui.label(statics::EN_LABEL_FIELD_NAME);
                        ui.add(
                            egui::TextEdit::singleline(&mut self.import_member_name)
                                .hint_text(statics::EN_HINT_MEMBER_NAME),
                        );
                    });
                }
                ui.radio_value(
                    &mut self.import_as_member,
                    false,
                    statics::EN_RADIO_IMPORT_CONTENTS,
                );
                ui.separator();
                ui.horizontal(|ui| {
                    let ready = !self.import_as_member
                        || !self.import_member_name.trim().is_empty();
                    if ui
                        .add_enabled(ready, egui::Button::new(statics::EN_BTN_IMPORT))
                        .clicked()
                    {
                        import_clicked = true;
                    }
                    if ui.button(statics::EN_BTN_CANCEL).clicked() {
                        cancel_clicked = true;
                    }
                });
            });
        if import_clicked {
            self.run_import();
        }
        if cancel_clicked {
            self.import_path = None;
        }
    }

    fn render_what_window(&mut self, ctx: &egui::Context) {
        if !self.what_open {
            return;
        }
        let mut save_clicked = false;
        let mut cancel_clicked = false;
        egui::Window::new(statics::EN_WINDOW_WHAT)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.radio_value(
                    &mut self.what_use_predefined,
                    true,
                    statics::EN_LABEL_PREDEFINED,
                );
                if self.what_use_predefined {
                    let current = statics::PREDEFINED_WHATS
                        .get(self.what_predefined_index)
                        .map_or("", |(name, _)| *name);
                    egui::ComboBox::from_id_salt("predefined_whats")
                        .selected_text(current)
                        .show_ui(ui, |ui| {
                            for (i, (name, value)) in
                                statics::PREDEFINED_WHATS.iter().enumerate()
                            {
                                if ui
                                    .selectable_label(
                                        i == self.what_predefined_index,
                                        format!("{name} ({})", format_what(*value)),
                                    )
                                    .clicked()
                                {
                                    self.what_predefined_index = i;
                                }
                            }
                        });
                }
                ui.radio_value(
                    &mut self.what_use_predefined,
                    false,
                    statics::EN_LABEL_CUSTOM,
                );
                if !self.what_use_predefined {
                    ui.text_edit_singleline(&mut self.what_custom_text);
                }
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button(statics::EN_BTN_SAVE).clicked() {
                        save_clicked = true;
                    }
                    if ui.button(statics::EN_BTN_CANCEL).clicked() {
                        cancel_clicked = true;
                    }
                });
            });
        if save_clicked {
            let what = if self.what_use_predefined {
                statics::PREDEFINED_WHATS
                    .get(self.what_predefined_index)
                    .map(|(_, v)| *v)
            } else {
                match self.what_custom_text.trim().parse::<u32>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        self.last_error = Some(format!(
                            "{:?} is not a valid message type number",
                            self.what_custom_text
                        ));
                        None
                    }
                }
            };
            if let Some(what) = what
                && let Some(archive) = self.archive.as_mut()
            {
                if archive.root.what() != what {
                    archive.root.set_what(what);
                    archive.mark_dirty();
                }
                self.what_open = false;
            }
        }
        if cancel_clicked {
            self.what_open = false;
        }
    }

    fn render_info_window(&mut self, ctx: &egui::Context) {
        if !self.info_open {
            return;
        }
        let mut open = self.info_open;
        egui::Window::new(statics::EN_WINDOW_INFO)
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let Some(archive) = self.archive.as_ref() else {
                    return;
                };
                egui::Grid::new("info_grid").num_columns(2).show(ui, |ui| {
                    ui.label(statics::EN_INFO_WHAT);
                    ui.label(format_what(archive.root.what()));
                    ui.end_row();
                    ui.label(statics::EN_INFO_FIELDS);
                    ui.label(archive.root.count_names().to_string());
                    ui.end_row();
                    ui.label(statics::EN_INFO_FLAT_SIZE);
                    ui.label(archive.root.flattened_size().to_string());
                    ui.end_row();
                });
            });
        self.info_open = open;
    }

    fn render_confirm_windows(&mut self, ctx: &egui::Context) {
        if let Some(action) = self.confirm_unsaved {
            let mut discard = false;
            let mut keep = false;
            egui::Window::new(statics::EN_WINDOW_CONFIRM)
                .id(egui::Id::new("confirm_unsaved"))
                .collapsible(false)
                .show(ctx, |ui| {
                    ui.label(statics::EN_CONFIRM_UNSAVED);
                    ui.horizontal(|ui| {
                        if ui.button(statics::EN_BTN_DISCARD).clicked() {
                            discard = true;
                        }
                        if ui.button(statics::EN_BTN_CANCEL).clicked() {
                            keep = true;
                        }
                    });
                });
            if discard {
                self.confirm_unsaved = None;
                self.perform(ctx, action);
            }
            if keep {
                self.confirm_unsaved = None;
            }
        }

        if self.confirm_reload_open {
            let mut reload = false;
            let mut keep = false;
            egui::Window::new(statics::EN_WINDOW_CONFIRM)
                .id(egui::Id::new("confirm_reload"))
                .collapsible(false)
                .show(ctx, |ui| {
                    ui.label(statics::EN_CONFIRM_RELOAD);
                    ui.horizontal(|ui| {
                        if ui.button(statics::EN_BTN_RELOAD).clicked() {
                            reload = true;
                        }
                        if ui.button(statics::EN_BTN_KEEP).clicked() {
                            keep = true;
                        }
                    });
                });
            if reload {
                self.confirm_reload_open = false;
                self.reload_file();
            }
            if keep {
                self.confirm_reload_open = false;
            }
        }
    }

    /// Quick-view panel: one row per value of the selected leaf field.
    fn render_data_panel(&mut self, ctx: &egui::Context) {
        let mut edit_index = None;
        let mut delete_index = None;
        egui::SidePanel::right("data_panel")
            .min_width(260.0)
            .show(ctx, |ui| {
                let Some(archive) = self.archive.as_ref() else {
                    return;
                };
                let Some(path) = self.selected_path.as_ref() else {
                    ui.label(statics::EN_SELECT_FIELD);
                    return;
                };
                let target: SelectionTarget = match resolve_selection(&archive.root, path) {
                    Ok(target) => target,
                    Err(e) => {
                        ui.colored_label(egui::Color32::RED, format!("{e}"));
                        return;
                    }
                };
                let Some(leaf) = target.leaf.clone() else {
                    ui.label(statics::EN_SELECT_FIELD);
                    return;
                };
                ui.heading(format!(
                    "{} [{}]",
                    leaf.name,
                    leaf.type_code.type_name()
                ));
                ui.separator();
                let scope = target.scope(&archive.root);
                TableBuilder::new(ui)
                    .striped(true)
                    .column(Column::auto())
                    .column(Column::remainder())
                    .column(Column::auto())
                    .column(Column::auto())
                    .header(18.0, |mut header| {
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_INDEX);
                        });
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_VALUE);
                        });
                        header.col(|_| {});
                        header.col(|_| {});
                    })
                    .body(|mut body| {
                        for (index, value) in scope.values(&leaf.name).iter().enumerate() {
                            body.row(20.0, |mut row| {
                                row.col(|ui| {
                                    ui.label(index.to_string());
                                });
                                row.col(|ui| {
                                    ui.label(value.preview());
                                });
                                row.col(|ui| {
                                    if ui.small_button(statics::EN_BTN_EDIT).clicked() {
                                        edit_index = Some(index);
                                    }
                                });
                                row.col(|ui| {
                                    if ui.small_button(statics::EN_BTN_DELETE).clicked() {
                                        delete_index = Some(index);
                                    }
                                });
                            });
                        }
                    });
            });
        if let Some(index) = edit_index
            && let Some(path) = self.selected_path.clone()
        {
            self.open_value_editor_at(&path, index);
        }
        if let Some(index) = delete_index {
            self.delete_value(index);
        }
    }
}

/// Message types are fourcc-ish numbers; show printable ones as characters.
fn format_what(what: u32) -> String {
    let chars = what.to_be_bytes();
    if chars.iter().all(|b| b.is_ascii_graphic()) {
        let text: String = chars.iter().map(|b| *b as char).collect();
        format!("'{text}' ({what})")
    } else {
        what.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_whats_render_as_fourcc() {
        let save = u32::from_be_bytes(*b"SAVE");
        assert_eq!(format_what(save), format!("'SAVE' ({save})"));
        assert_eq!(format_what(7), "7");
    }

    #[test]
    fn addable_types_exclude_raw_and_message() {
        assert!(!ADDABLE_TYPES.contains(&TypeCode::Raw));
        assert!(!ADDABLE_TYPES.contains(&TypeCode::Message));
        for code in ADDABLE_TYPES {
            assert!(crate::editors::EditorState::for_new(code).is_supported());
        }
    }
}
