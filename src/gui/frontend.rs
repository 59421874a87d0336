use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, Color32, CursorIcon, FontId, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use log::warn;

use crate::graph_utils::graph::{Gender, Relationship, RelationshipKind, Sim, SimFields, SimId};
use crate::graph_utils::snapshot::Snapshot;
use crate::persistence::persist::{self, AppStateFile};
use crate::persistence::settings::AppSettings;
use super::graph_view::{GraphView, ViewEvent};
use super::interaction::PointerButton;
use super::render::{AvatarVisual, CONNECTOR_THICKNESS, CanvasLayer, Scene, gender_color, initials};

const LIFE_STAGES: [&str; 7] = ["baby", "toddler", "child", "teen", "young-adult", "adult", "elder"];

const CANVAS_BG: Color32 = Color32::from_rgb(241, 245, 249);
const CARD_FILL: Color32 = Color32::WHITE;
const CARD_STROKE: Color32 = Color32::from_rgb(203, 213, 225);
const SELECTED_STROKE: Color32 = Color32::from_rgb(99, 102, 241);
const TEXT_DARK: Color32 = Color32::from_rgb(30, 41, 59);
const TEXT_MUTED: Color32 = Color32::from_rgb(100, 116, 139);

fn connector_color(kind: RelationshipKind) -> Color32 {
    match kind {
        RelationshipKind::Parent => Color32::from_rgb(16, 185, 129),
        RelationshipKind::Spouse => Color32::from_rgb(236, 72, 153),
        RelationshipKind::Sibling => Color32::from_rgb(245, 158, 11),
    }
}

// Form state for adding or editing a sim
#[derive(Clone, Debug)]
struct SimForm {
    editing: Option<SimId>,
    name: String,
    gender: Gender,
    age: String,
    traits: String,
    aspiration: String,
    occupation: String,
    avatar: String,
    notes: String,
    error: Option<String>,
}

impl SimForm {
    fn blank() -> Self {
        Self {
            editing: None,
            name: String::new(),
            gender: Gender::Male,
            age: "adult".into(),
            traits: String::new(),
            aspiration: String::new(),
            occupation: String::new(),
            avatar: String::new(),
            notes: String::new(),
            error: None,
        }
    }

    fn edit(sim: &Sim) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            editing: Some(sim.id.clone()),
            name: sim.name.clone(),
            gender: sim.gender.unwrap_or(Gender::Male),
            age: sim.age.clone().unwrap_or_else(|| "adult".into()),
            traits: text(&sim.traits),
            aspiration: text(&sim.aspiration),
            occupation: text(&sim.occupation),
            avatar: text(&sim.avatar),
            notes: text(&sim.notes),
            error: None,
        }
    }

    fn to_fields(&self) -> SimFields {
        SimFields {
            id: None,
            name: Some(self.name.trim().to_string()),
            gender: Some(self.gender),
            age: Some(self.age.clone()),
            traits: Some(self.traits.clone()),
            aspiration: Some(self.aspiration.clone()),
            occupation: Some(self.occupation.clone()),
            avatar: Some(self.avatar.trim().to_string()),
            notes: Some(self.notes.clone()),
            x: None,
            y: None,
        }
    }
}

#[derive(Clone, Debug)]
struct RelationshipForm {
    kind: RelationshipKind,
    from: Option<SimId>,
    to: Option<SimId>,
    error: Option<String>,
}

impl RelationshipForm {
    fn endpoint_labels(&self) -> (&'static str, &'static str) {
        match self.kind {
            RelationshipKind::Parent => ("Parent", "Child"),
            RelationshipKind::Spouse => ("Spouse 1", "Spouse 2"),
            RelationshipKind::Sibling => ("Sibling 1", "Sibling 2"),
        }
    }

    // Endpoints must be chosen and distinct before reaching the view
    fn validate(&self) -> Result<Relationship, String> {
        match (&self.from, &self.to) {
            (Some(a), Some(b)) if a == b => Err("Cannot create a relationship with the same sim!".into()),
            (Some(a), Some(b)) => Ok(Relationship::new(a.clone(), b.clone(), self.kind)),
            _ => Err("Please select both sims for the relationship!".into()),
        }
    }
}

// Destructive actions waiting for a yes/no
enum PendingConfirm {
    Clear,
    DeleteSim(SimId),
    Replace(Box<Snapshot>),
}

impl PendingConfirm {
    fn message(&self) -> &'static str {
        match self {
            PendingConfirm::Clear => "Are you sure you want to delete everything? This cannot be undone!",
            PendingConfirm::DeleteSim(_) => "Are you sure you want to delete this sim?",
            PendingConfirm::Replace(_) => "This will replace your current family tree. Continue?",
        }
    }
}

enum FormOutcome {
    Open,
    Submit,
    Close,
}

pub struct FamilyTreeApp {
    view: GraphView,
    selection_rx: Receiver<ViewEvent>,
    // Row highlighted in the sim list, driven by selection events
    highlighted: Option<SimId>,
    scroll_to_highlight: bool,
    settings: AppSettings,
    // persistence
    dirty: bool,
    last_save: Instant,
    status: Option<String>,
    // sidebar
    search: String,
    // windows
    sim_form: Option<SimForm>,
    rel_form: Option<RelationshipForm>,
    show_import_window: bool,
    import_path: String,
    confirm: Option<PendingConfirm>,
}

impl FamilyTreeApp {
    pub fn new(mut view: GraphView, settings: AppSettings) -> Self {
        let selection_rx = view.subscribe();
        Self {
            view,
            selection_rx,
            highlighted: None,
            scroll_to_highlight: false,
            settings,
            dirty: false,
            last_save: Instant::now(),
            status: None,
            search: String::new(),
            sim_form: None,
            rel_form: None,
            show_import_window: false,
            import_path: String::new(),
            confirm: None,
        }
    }

    pub fn from_state(state: AppStateFile, settings: AppSettings) -> Self {
        let (snapshot, viewport) = state.to_runtime();
        Self::new(GraphView::from_snapshot(snapshot, viewport), settings)
    }

    fn mark_dirty(&mut self) { self.dirty = true; }

    fn save_now(&mut self) {
        let state = AppStateFile::from_runtime(self.view.export_snapshot(), self.view.viewport());
        match persist::save_active(&state) {
            Ok(path) => {
                self.dirty = false;
                self.status = Some(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                warn!("autosave failed: {}", e);
                self.status = Some(format!("Save failed: {}", e));
            }
        }
        self.last_save = Instant::now();
    }

    fn autosave_if_due(&mut self) {
        if self.dirty && self.last_save.elapsed() >= self.settings.autosave_interval() {
            self.save_now();
        }
    }

    fn replace_tree(&mut self, snapshot: Snapshot) {
        self.view.import_snapshot(snapshot);
        self.highlighted = None;
        self.mark_dirty();
        self.save_now();
    }

    // Import/example replace the tree; ask first when there is something to lose
    fn request_replace(&mut self, snapshot: Snapshot) {
        if self.view.graph().is_empty() {
            self.replace_tree(snapshot);
        } else {
            self.confirm = Some(PendingConfirm::Replace(Box::new(snapshot)));
        }
    }

    fn export_now(&mut self) {
        let path = self.settings.export_dir().join(persist::export_file_name_now());
        self.status = Some(match persist::export_snapshot_json(&self.view.export_snapshot(), &path) {
            Ok(()) => format!("Exported JSON to {}", path.display()),
            Err(e) => format!("Export failed: {}", e),
        });
    }

    fn import_from_path(&mut self) {
        let path = std::path::PathBuf::from(self.import_path.trim());
        match persist::import_snapshot_json(&path) {
            Ok(snapshot) => {
                self.show_import_window = false;
                self.request_replace(snapshot);
                self.status = Some(format!("Imported {}", path.display()));
            }
            Err(e) => self.status = Some(format!("Error importing file: {}", e)),
        }
    }

    fn open_relationship_form(&mut self) {
        if self.view.graph().sim_count() < 2 {
            self.status = Some("You need at least 2 sims to create a relationship!".into());
            return;
        }
        self.rel_form = Some(RelationshipForm { kind: RelationshipKind::Parent, from: None, to: None, error: None });
    }

    fn drain_selection_events(&mut self) {
        while let Ok(ViewEvent::SimSelected(id)) = self.selection_rx.try_recv() {
            self.highlighted = Some(id);
            self.scroll_to_highlight = true;
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S))) {
                self.save_now();
            }
            if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Num0))) {
                self.view.reset_view();
                self.mark_dirty();
            }

            ui.horizontal(|ui| {
                ui.label(RichText::new("Sim Family Tree").strong());
                ui.separator();
                if ui.button("Add Sim").clicked() {
                    self.sim_form = Some(SimForm::blank());
                }
                if ui.button("Add Relationship").clicked() {
                    self.open_relationship_form();
                }
                ui.separator();
                if ui.button("Zoom In").clicked() {
                    self.view.zoom(1.2);
                    self.mark_dirty();
                }
                if ui.button("Zoom Out").clicked() {
                    self.view.zoom(0.8);
                    self.mark_dirty();
                }
                if ui.button("Reset View").clicked() {
                    self.view.reset_view();
                    self.mark_dirty();
                }
                if ui.button("Auto Layout").clicked() {
                    self.view.auto_layout();
                    self.mark_dirty();
                }
                ui.separator();
                if ui.button("Import…").clicked() {
                    self.show_import_window = true;
                }
                if ui.button("Export").clicked() {
                    self.export_now();
                }
                if ui.button("Load Example").clicked() {
                    self.request_replace(Snapshot::example_family());
                }
                if ui.button("Clear").clicked() {
                    self.confirm = Some(PendingConfirm::Clear);
                }
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let vp = self.view.viewport();
                ui.small(format!("{} sims · {} relationships · {:.0}%",
                    self.view.graph().sim_count(),
                    self.view.relationships().len(),
                    vp.scale() * 100.0,
                ));
                if let Some(msg) = &self.status {
                    ui.separator();
                    ui.small(msg.clone());
                }
            });
        });
    }

    fn sims_list(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sims_list").resizable(true).default_width(260.0).show(ctx, |ui| {
            ui.heading("Sims");
            ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("Search sims…"));
            ui.separator();

            let ids = self.view.graph().find_sim_ids_matching(self.search.trim());
            if ids.is_empty() {
                ui.label(RichText::new("No sims found").color(TEXT_MUTED));
                return;
            }

            let mut select: Option<SimId> = None;
            let mut edit: Option<SimId> = None;
            let mut delete: Option<SimId> = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                for id in &ids {
                    let Some(sim) = self.view.get_sim(id) else { continue };
                    let is_hl = self.highlighted.as_deref() == Some(id.as_str());
                    let frame = egui::Frame::group(ui.style()).stroke(if is_hl {
                        Stroke::new(2.0, SELECTED_STROKE)
                    } else {
                        Stroke::new(1.0, CARD_STROKE)
                    });
                    let resp = frame.show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            let badge = RichText::new(initials(&sim.name))
                                .color(Color32::WHITE)
                                .background_color(gender_color(sim.gender));
                            ui.label(badge);
                            if ui.selectable_label(is_hl, RichText::new(&sim.name).strong()).clicked() {
                                select = Some(id.clone());
                            }
                        });
                        let gender = sim.gender.map(|g| g.as_str()).unwrap_or("N/A");
                        ui.small(format!("{} • {}", sim.age.as_deref().filter(|s| !s.is_empty()).unwrap_or("Adult"), gender));
                        if let Some(job) = sim.occupation.as_deref().filter(|s| !s.is_empty()) {
                            ui.small(format!("Occupation: {}", job));
                        }
                        if let Some(traits) = sim.traits.as_deref().filter(|s| !s.is_empty()) {
                            ui.small(format!("Traits: {}", traits));
                        }
                        ui.horizontal(|ui| {
                            if ui.small_button("Edit").clicked() {
                                edit = Some(id.clone());
                            }
                            if ui.small_button("Delete").clicked() {
                                delete = Some(id.clone());
                            }
                        });
                    });
                    if is_hl && self.scroll_to_highlight {
                        resp.response.scroll_to_me(Some(egui::Align::Center));
                        self.scroll_to_highlight = false;
                    }
                }
            });

            if let Some(id) = select {
                self.view.select(&id);
            }
            if let Some(id) = edit {
                if let Some(sim) = self.view.get_sim(&id) {
                    self.sim_form = Some(SimForm::edit(sim));
                }
            }
            if let Some(id) = delete {
                self.confirm = Some(PendingConfirm::DeleteSim(id));
            }
        });
    }

    fn sim_form_window(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.sim_form.take() else { return };
        let title = if form.editing.is_some() { "Edit Sim" } else { "Add New Sim" };
        let mut open = true;
        let mut outcome = FormOutcome::Open;
        egui::Window::new(title)
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("sim_form_grid").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut form.name);
                    ui.end_row();

                    ui.label("Gender");
                    egui::ComboBox::from_id_salt("sim_gender")
                        .selected_text(form.gender.as_str())
                        .show_ui(ui, |ui| {
                            for g in Gender::ALL {
                                ui.selectable_value(&mut form.gender, g, g.as_str());
                            }
                        });
                    ui.end_row();

                    ui.label("Life stage");
                    egui::ComboBox::from_id_salt("sim_age")
                        .selected_text(form.age.clone())
                        .show_ui(ui, |ui| {
                            for stage in LIFE_STAGES {
                                ui.selectable_value(&mut form.age, stage.to_string(), stage);
                            }
                        });
                    ui.end_row();

                    ui.label("Traits");
                    ui.text_edit_singleline(&mut form.traits);
                    ui.end_row();
                    ui.label("Aspiration");
                    ui.text_edit_singleline(&mut form.aspiration);
                    ui.end_row();
                    ui.label("Occupation");
                    ui.text_edit_singleline(&mut form.occupation);
                    ui.end_row();
                    ui.label("Avatar URL");
                    ui.text_edit_singleline(&mut form.avatar);
                    ui.end_row();
                    ui.label("Notes");
                    ui.text_edit_multiline(&mut form.notes);
                    ui.end_row();
                });
                if let Some(err) = &form.error {
                    ui.colored_label(Color32::RED, err);
                }
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        outcome = FormOutcome::Submit;
                    }
                    if ui.button("Cancel").clicked() {
                        outcome = FormOutcome::Close;
                    }
                });
            });
        if !open {
            outcome = FormOutcome::Close;
        }

        match outcome {
            FormOutcome::Open => self.sim_form = Some(form),
            FormOutcome::Close => {}
            FormOutcome::Submit if form.name.trim().is_empty() => {
                form.error = Some("Name is required".into());
                self.sim_form = Some(form);
            }
            FormOutcome::Submit => {
                match &form.editing {
                    Some(id) => self.view.update_sim(id, form.to_fields()),
                    None => {
                        self.view.add_sim(form.to_fields());
                    }
                }
                self.mark_dirty();
                self.save_now();
            }
        }
    }

    fn relationship_form_window(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.rel_form.take() else { return };
        let sims: Vec<(SimId, String)> = self.view.graph().sims().map(|s| (s.id.clone(), s.name.clone())).collect();
        let name_of = |id: &Option<SimId>| {
            id.as_ref()
                .and_then(|id| sims.iter().find(|(sid, _)| sid == id))
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| "Select...".into())
        };
        let mut open = true;
        let mut outcome = FormOutcome::Open;
        egui::Window::new("Add Relationship")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Type");
                    for kind in RelationshipKind::ALL {
                        ui.selectable_value(&mut form.kind, kind, kind.to_string());
                    }
                });
                let (from_label, to_label) = form.endpoint_labels();
                egui::Grid::new("rel_form_grid").num_columns(2).show(ui, |ui| {
                    ui.label(from_label);
                    egui::ComboBox::from_id_salt("rel_from")
                        .selected_text(name_of(&form.from))
                        .show_ui(ui, |ui| {
                            for (id, name) in &sims {
                                ui.selectable_value(&mut form.from, Some(id.clone()), name.as_str());
                            }
                        });
                    ui.end_row();
                    ui.label(to_label);
                    egui::ComboBox::from_id_salt("rel_to")
                        .selected_text(name_of(&form.to))
                        .show_ui(ui, |ui| {
                            for (id, name) in &sims {
                                ui.selectable_value(&mut form.to, Some(id.clone()), name.as_str());
                            }
                        });
                    ui.end_row();
                });
                if let Some(err) = &form.error {
                    ui.colored_label(Color32::RED, err);
                }
                ui.horizontal(|ui| {
                    if ui.button("Add").clicked() {
                        outcome = FormOutcome::Submit;
                    }
                    if ui.button("Cancel").clicked() {
                        outcome = FormOutcome::Close;
                    }
                });
            });
        if !open {
            outcome = FormOutcome::Close;
        }

        match outcome {
            FormOutcome::Open => self.rel_form = Some(form),
            FormOutcome::Close => {}
            FormOutcome::Submit => match form.validate() {
                Ok(rel) => {
                    self.view.add_relationship(rel);
                    self.mark_dirty();
                    self.save_now();
                }
                Err(msg) => {
                    form.error = Some(msg);
                    self.rel_form = Some(form);
                }
            },
        }
    }

    fn import_window(&mut self, ctx: &egui::Context) {
        if !self.show_import_window {
            return;
        }
        let mut open = true;
        let mut do_import = false;
        egui::Window::new("Import Family Tree")
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label("Path to a family tree JSON file:");
                ui.text_edit_singleline(&mut self.import_path);
                if ui.button("Import").clicked() {
                    do_import = true;
                }
            });
        if !open {
            self.show_import_window = false;
        }
        if do_import {
            self.import_from_path();
        }
    }

    fn confirm_window(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.confirm.take() else { return };
        let mut answer: Option<bool> = None;
        egui::Window::new("Confirm")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(pending.message());
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                });
            });
        match (answer, pending) {
            (None, pending) => self.confirm = Some(pending),
            (Some(false), _) => {}
            (Some(true), PendingConfirm::Clear) => {
                self.view.clear();
                self.highlighted = None;
                self.mark_dirty();
                self.save_now();
            }
            (Some(true), PendingConfirm::DeleteSim(id)) => {
                self.view.delete_sim(&id);
                self.mark_dirty();
                self.save_now();
            }
            (Some(true), PendingConfirm::Replace(snapshot)) => self.replace_tree(*snapshot),
        }
    }

    // Translate egui pointer state into the view's pointer events
    fn forward_input(&mut self, ctx: &egui::Context, canvas: &egui::Response) {
        let now = Instant::now();
        let (latest, pressed, released, scroll) = ctx.input(|i| {
            let buttons = [
                (egui::PointerButton::Primary, PointerButton::Primary),
                (egui::PointerButton::Middle, PointerButton::Middle),
                (egui::PointerButton::Secondary, PointerButton::Secondary),
            ];
            let pressed: Vec<PointerButton> = buttons
                .iter()
                .filter(|(b, _)| i.pointer.button_pressed(*b))
                .map(|(_, ours)| *ours)
                .collect();
            let released = buttons.iter().any(|(b, _)| i.pointer.button_released(*b));
            (i.pointer.latest_pos(), pressed, released, i.raw_scroll_delta.y)
        });

        if let Some(pos) = latest {
            if canvas.hovered() {
                for button in pressed {
                    self.view.pointer_down(pos, button, now);
                }
            }
            if !self.view.interaction().is_idle() {
                self.view.pointer_move(pos);
            }
            if released && !self.view.interaction().is_idle() {
                self.view.pointer_up(pos, now);
                self.mark_dirty();
            }
        }

        if canvas.hovered() && scroll != 0.0 {
            // egui scrolls up with positive y; the view expects wheel deltas
            self.view.wheel(-scroll);
            self.mark_dirty();
        }
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().frame(egui::Frame::NONE.fill(CANVAS_BG)).show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();
            self.view.set_canvas_rect(available);
            let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());

            self.forward_input(ctx, &bg_resp);
            // Flush at most one drag update per displayed frame
            self.view.on_frame();

            if self.view.interaction().is_panning() {
                ctx.set_cursor_icon(CursorIcon::Grabbing);
            } else if self.view.interaction().dragged_sim().is_some() {
                ctx.set_cursor_icon(CursorIcon::Grabbing);
            } else if let Some(pos) = ctx.pointer_hover_pos() {
                if bg_resp.hovered() && self.view.hit_test(pos).is_some() {
                    ctx.set_cursor_icon(CursorIcon::Move);
                }
            }

            let painter = ui.painter_at(available);
            match self.view.scene() {
                Scene::Welcome => {
                    let c = available.center();
                    painter.text(c - Vec2::new(0.0, 14.0), Align2::CENTER_CENTER, "Welcome to Sims Family Tree Editor", FontId::proportional(22.0), TEXT_DARK);
                    painter.text(c + Vec2::new(0.0, 14.0), Align2::CENTER_CENTER, "Start by adding your first Sim or load an example family tree", FontId::proportional(14.0), TEXT_MUTED);
                }
                Scene::Canvas(layer) => paint_layer(ui, &painter, &self.view, layer),
            }
        });
    }
}

fn paint_layer(ui: &egui::Ui, painter: &egui::Painter, view: &GraphView, layer: &CanvasLayer) {
    let scale = layer.scale;
    for c in &layer.connectors {
        let a = view.to_screen(c.origin);
        let b = view.to_screen(c.end());
        let stroke = Stroke::new((CONNECTOR_THICKNESS * scale).max(1.0), connector_color(c.kind));
        match c.kind {
            RelationshipKind::Sibling => {
                painter.extend(egui::Shape::dashed_line(&[a, b], stroke, 8.0 * scale, 5.0 * scale));
            }
            RelationshipKind::Spouse => {
                painter.line_segment([a, b], Stroke::new(stroke.width * 1.5, stroke.color));
            }
            RelationshipKind::Parent => {
                painter.line_segment([a, b], stroke);
            }
        }
    }

    for node in &layer.nodes {
        let model = node.rect();
        let rect = Rect::from_min_max(view.to_screen(model.min), view.to_screen(model.max));
        let outline = if node.selected {
            Stroke::new(3.0, SELECTED_STROKE)
        } else {
            Stroke::new(1.0, CARD_STROKE)
        };
        painter.rect_filled(rect, 10.0 * scale, CARD_FILL);
        painter.rect_stroke(rect, 10.0 * scale, outline, egui::StrokeKind::Outside);

        let avatar_center = Pos2::new(rect.center().x, rect.top() + 28.0 * scale);
        let radius = 20.0 * scale;
        match &node.avatar {
            AvatarVisual::Image(uri) => {
                let avatar_rect = Rect::from_center_size(avatar_center, Vec2::splat(radius * 2.0));
                egui::Image::new(uri.as_str()).corner_radius(radius).paint_at(ui, avatar_rect);
            }
            AvatarVisual::Initials { text, color } => {
                painter.circle_filled(avatar_center, radius, *color);
                painter.text(avatar_center, Align2::CENTER_CENTER, text, FontId::proportional((14.0 * scale).max(6.0)), Color32::WHITE);
            }
        }
        painter.text(
            Pos2::new(rect.center().x, rect.top() + 62.0 * scale),
            Align2::CENTER_CENTER,
            &node.name,
            FontId::proportional((14.0 * scale).max(6.0)),
            TEXT_DARK,
        );
        painter.text(
            Pos2::new(rect.center().x, rect.top() + 82.0 * scale),
            Align2::CENTER_CENTER,
            &node.detail,
            FontId::proportional((11.0 * scale).max(5.0)),
            TEXT_MUTED,
        );
    }
}

impl eframe::App for FamilyTreeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_selection_events();

        self.top_bar(ctx);
        self.status_bar(ctx);
        self.sims_list(ctx);
        self.canvas(ctx);

        self.sim_form_window(ctx);
        self.relationship_form_window(ctx);
        self.import_window(ctx);
        self.confirm_window(ctx);

        // Selection made from the canvas this frame shows up in the list next frame
        self.drain_selection_events();
        self.autosave_if_due();

        if self.view.has_pending_frame() || !self.view.interaction().is_idle() {
            ctx.request_repaint();
        } else if self.dirty {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.dirty {
            self.save_now();
        }
    }
}
