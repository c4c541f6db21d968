//! Main application state and UI coordination

use std::path::{Path, PathBuf};

use eframe::egui;

use crate::core::config::{AppConfig, Theme, ViewMode};
use crate::core::convert::{load_engine, Converter, DEFAULT_ENGINE};
use crate::core::document::{is_markdown_path, Document, MARKDOWN_EXTENSIONS};
use crate::core::export;
use crate::core::scroll_spy::ScrollSpy;
use crate::core::watcher::FileWatcher;
use crate::ui::markdown_blocks::{outline, parse_blocks};
use crate::ui::preview::{request_heading, PreviewPanel, Rendered};
use crate::ui::toast::Toasts;
use crate::ui::{editor::EditorPanel, toc::TocPanel};

/// User-triggered actions, from the menu bar or keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    LoadExample,
    Reset,
    Save,
    SaveAs,
    CopyHtml,
    ExportHtml,
    Print,
    Refresh,
    ToggleFullscreen,
    ToggleTheme,
    ToggleToc,
    SetView(ViewMode),
}

impl Command {
    /// Commands bound to keys pressed this frame
    fn from_shortcuts(i: &egui::InputState) -> Vec<Command> {
        let mut commands = Vec::new();
        let cmd = i.modifiers.command;

        if cmd && i.key_pressed(egui::Key::O) {
            commands.push(Command::Open);
        }
        if cmd && i.key_pressed(egui::Key::S) {
            commands.push(if i.modifiers.shift {
                Command::SaveAs
            } else {
                Command::Save
            });
        }
        if cmd && i.modifiers.shift && i.key_pressed(egui::Key::C) {
            commands.push(Command::CopyHtml);
        }
        if cmd && i.key_pressed(egui::Key::P) {
            commands.push(Command::Print);
        }
        if cmd && i.key_pressed(egui::Key::T) {
            commands.push(Command::ToggleTheme);
        }
        if cmd && i.key_pressed(egui::Key::B) {
            commands.push(Command::ToggleToc);
        }
        if i.key_pressed(egui::Key::F5) {
            commands.push(Command::Refresh);
        }
        if i.key_pressed(egui::Key::F11) {
            commands.push(Command::ToggleFullscreen);
        }

        commands
    }
}

/// Main application state
pub struct PreviewApp {
    pub config: AppConfig,
    /// The document being previewed
    pub document: Document,
    /// Loaded conversion engine; `None` when loading failed
    pub converter: Option<Converter>,
    /// Why the engine could not be loaded
    pub engine_error: Option<String>,
    pub rendered: Rendered,
    /// Document changed since the last render
    pub render_dirty: bool,
    pub spy: ScrollSpy,
    pub toasts: Toasts,
    watcher: Option<FileWatcher>,
    is_dragging: bool,
    ctx: egui::Context,
}

impl PreviewApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>, initial_file: Option<PathBuf>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {}", e);
            AppConfig::default()
        });
        cc.egui_ctx.set_visuals(config.theme.visuals());

        let mut app = Self {
            config,
            document: Document::blank(),
            converter: None,
            engine_error: None,
            rendered: Rendered::default(),
            render_dirty: true,
            spy: ScrollSpy::new(),
            toasts: Toasts::default(),
            watcher: None,
            is_dragging: false,
            ctx: cc.egui_ctx.clone(),
        };

        let engine = app.config.engine.clone();
        app.load_engine(&engine);

        if let Some(path) = initial_file {
            app.open_path(&path);
        }

        app
    }

    /// Load the conversion engine by name
    fn load_engine(&mut self, name: &str) {
        match load_engine(name) {
            Ok(engine) => {
                tracing::info!("Loaded markdown engine: {}", engine.name());
                self.converter = Some(Converter::new(engine));
                self.engine_error = None;
            }
            Err(e) => {
                tracing::error!("Failed to load markdown engine: {}", e);
                self.converter = None;
                self.engine_error = Some(e.to_string());
            }
        }
        self.render_dirty = true;
    }

    /// Replace the current document
    pub fn set_document(&mut self, document: Document) {
        self.watcher = None;

        if let Some(path) = document.path().map(Path::to_path_buf) {
            self.config.add_recent_file(path.clone());
            self.save_config();
            if self.config.watch_file {
                self.watch(&path);
            }
        }

        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Title(format!("{} - mdpreview", document.title())));
        self.document = document;
        self.render_dirty = true;
    }

    fn watch(&mut self, path: &Path) {
        let ctx = self.ctx.clone();
        match FileWatcher::new(path, move || ctx.request_repaint()) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => tracing::warn!("Not watching {}: {:#}", path.display(), e),
        }
    }

    /// Open a document from disk
    pub fn open_path(&mut self, path: &Path) {
        match Document::open(path) {
            Ok(doc) => {
                tracing::info!("Opened {}", path.display());
                self.set_document(doc);
            }
            Err(e) => {
                tracing::error!("Failed to open document: {:#}", e);
                self.toasts.error(format!("{e:#}"));
            }
        }
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .pick_file()
        {
            self.open_path(&path);
        }
    }

    fn save(&mut self) {
        if self.document.path().is_none() {
            self.save_as();
            return;
        }
        match self.document.save() {
            Ok(()) => self.toasts.info("Saved"),
            Err(e) => {
                tracing::error!("Failed to save document: {:#}", e);
                self.toasts.error(format!("{e:#}"));
            }
        }
    }

    fn save_as(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .set_file_name(format!("{}.md", self.document.title()))
            .save_file()
        else {
            return;
        };

        match self.document.save_as(&path) {
            Ok(()) => {
                let saved = self.document.clone();
                self.set_document(saved);
                self.toasts.info(format!("Saved {}", path.display()));
            }
            Err(e) => {
                tracing::error!("Failed to save document: {:#}", e);
                self.toasts.error(format!("{e:#}"));
            }
        }
    }

    /// Convert the document and rebuild everything derived from it
    pub fn rerender(&mut self) {
        self.render_dirty = false;

        let Some(converter) = &self.converter else {
            self.rendered = Rendered::default();
            self.spy.reset(Vec::new());
            return;
        };

        let body = self.document.body();
        let mut errors: Vec<String> = Vec::new();
        let html = converter.convert(body, &mut errors);
        let failed = errors.first().cloned();
        for error in errors {
            self.toasts.error(error);
        }

        let blocks = if failed.is_some() {
            Vec::new()
        } else {
            parse_blocks(body)
        };
        let outline = outline(&blocks);
        self.spy.reset(outline.iter().map(|entry| entry.id.clone()).collect());

        tracing::debug!(
            "Rendered {} bytes of HTML, {} headings",
            html.len(),
            outline.len()
        );

        self.rendered = Rendered {
            html,
            blocks,
            outline,
            failed,
        };
    }

    /// Reload the file after an external change
    fn poll_watcher(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        if !watcher.poll_changed() {
            return;
        }

        if self.document.modified {
            self.toasts
                .info("File changed on disk; keeping your unsaved edits");
            return;
        }

        let path = watcher.path().to_path_buf();
        match Document::open(&path) {
            Ok(doc) if doc.content != self.document.content => {
                tracing::info!("Reloaded {}", path.display());
                self.document = doc;
                self.render_dirty = true;
                self.toasts.info("Reloaded from disk");
            }
            Ok(_) => {}
            // Editors often replace files in several steps
            Err(e) => tracing::debug!("Reload skipped: {:#}", e),
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });
        self.is_dragging = hovering;

        let Some(file) = dropped.first() else {
            return;
        };
        if dropped.len() > 1 {
            self.toasts.info("Only the first dropped file is shown");
        }

        let name_path = file
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&file.name));
        if !is_markdown_path(&name_path) {
            self.toasts.error(format!(
                "Unsupported file type: {}. Drop a markdown or text file ({})",
                name_path.display(),
                MARKDOWN_EXTENSIONS.join(", ")
            ));
            return;
        }

        match (&file.path, &file.bytes) {
            (Some(path), _) => self.open_path(path),
            (None, Some(bytes)) => self.set_document(Document::from_bytes(file.name.clone(), bytes)),
            (None, None) => self.toasts.error("Dropped file has no readable content"),
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {:#}", e);
        }
    }

    /// Run a user action
    pub fn run(&mut self, ctx: &egui::Context, command: Command) {
        tracing::debug!("Command: {:?}", command);

        match command {
            Command::Open => self.open_file_dialog(),
            Command::LoadExample => self.set_document(Document::example()),
            Command::Reset => self.set_document(Document::blank()),
            Command::Save => self.save(),
            Command::SaveAs => self.save_as(),
            Command::CopyHtml => {
                if self.rendered.html.is_empty() {
                    self.toasts.info("Nothing to copy");
                } else {
                    ctx.copy_text(self.rendered.html.clone());
                    self.toasts.info("Copied rendered HTML to clipboard");
                }
            }
            Command::ExportHtml => self.export_html(),
            Command::Print => self.print(),
            Command::Refresh => {
                self.rerender();
                self.toasts.info("Preview refreshed");
            }
            Command::ToggleFullscreen => {
                let is_fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!is_fullscreen));
            }
            Command::ToggleTheme => {
                self.config.theme = self.config.theme.toggled();
                ctx.set_visuals(self.config.theme.visuals());
                self.save_config();
            }
            Command::ToggleToc => {
                self.config.show_toc = !self.config.show_toc;
                self.save_config();
            }
            Command::SetView(mode) => {
                self.config.view_mode = mode;
                self.save_config();
            }
        }
    }

    fn print(&mut self) {
        if self.rendered.html.is_empty() {
            self.toasts.info("Nothing to print");
            return;
        }
        match export::print(&self.document.title(), &self.rendered.html) {
            Ok(path) => self
                .toasts
                .info(format!("Opened {} for printing", path.display())),
            Err(e) => {
                tracing::error!("Failed to print: {:#}", e);
                self.toasts.error(format!("{e:#}"));
            }
        }
    }

    fn export_html(&mut self) {
        let title = self.document.title();
        let Some(path) = rfd::FileDialog::new()
            .add_filter("HTML", &["html", "htm"])
            .set_file_name(format!("{title}.html"))
            .save_file()
        else {
            return;
        };

        match export::write_html(&path, &title, &self.rendered.html, self.config.theme) {
            Ok(()) => self.toasts.info(format!("Exported {}", path.display())),
            Err(e) => {
                tracing::error!("Failed to export HTML: {:#}", e);
                self.toasts.error(format!("{e:#}"));
            }
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let mut commands = Vec::new();
        let has_engine = self.converter.is_some();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let mut item = |ui: &mut egui::Ui, label: &str, shortcut: &str, command| {
                        if ui
                            .add(egui::Button::new(label).shortcut_text(shortcut))
                            .clicked()
                        {
                            commands.push(command);
                            ui.close();
                        }
                    };
                    item(ui, "Open...", "Ctrl+O", Command::Open);
                    item(ui, "Load Example", "", Command::LoadExample);
                    item(ui, "Reset", "", Command::Reset);
                    ui.separator();
                    item(ui, "Save", "Ctrl+S", Command::Save);
                    item(ui, "Save As...", "Ctrl+Shift+S", Command::SaveAs);
                    item(ui, "Export HTML...", "", Command::ExportHtml);
                    item(ui, "Print...", "Ctrl+P", Command::Print);

                    if !self.config.recent_files.is_empty() {
                        ui.separator();
                        ui.menu_button("Recent Files", |ui| {
                            for path in self.config.recent_files.clone() {
                                if ui.button(path.display().to_string()).clicked() {
                                    self.open_path(&path);
                                    ui.close();
                                }
                            }
                        });
                    }

                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(
                            has_engine,
                            egui::Button::new("Copy HTML").shortcut_text("Ctrl+Shift+C"),
                        )
                        .clicked()
                    {
                        commands.push(Command::CopyHtml);
                        ui.close();
                    }
                    if ui
                        .add_enabled(has_engine, egui::Button::new("Refresh Preview").shortcut_text("F5"))
                        .clicked()
                    {
                        commands.push(Command::Refresh);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    for (mode, label) in [
                        (ViewMode::Editor, "Editor Only"),
                        (ViewMode::Preview, "Preview Only"),
                        (ViewMode::Split, "Split View"),
                    ] {
                        if ui
                            .selectable_label(self.config.view_mode == mode, label)
                            .clicked()
                        {
                            commands.push(Command::SetView(mode));
                            ui.close();
                        }
                    }
                    ui.separator();
                    let mut show_toc = self.config.show_toc;
                    if ui.checkbox(&mut show_toc, "Table of Contents").changed() {
                        commands.push(Command::ToggleToc);
                        ui.close();
                    }
                    let theme_label = match self.config.theme.toggled() {
                        Theme::Light => "Light Theme",
                        Theme::Dark => "Dark Theme",
                    };
                    if ui
                        .add(egui::Button::new(theme_label).shortcut_text("Ctrl+T"))
                        .clicked()
                    {
                        commands.push(Command::ToggleTheme);
                        ui.close();
                    }
                    if ui
                        .add(egui::Button::new("Toggle Fullscreen").shortcut_text("F11"))
                        .clicked()
                    {
                        commands.push(Command::ToggleFullscreen);
                        ui.close();
                    }
                });
            });
        });

        commands
    }

    /// Render the bottom status bar
    fn render_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let marker = if self.document.modified { "*" } else { "" };
                ui.label(format!("{}{}", self.document.title(), marker));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let engine = self
                        .converter
                        .as_ref()
                        .map(Converter::engine_name)
                        .unwrap_or("no engine");
                    ui.label(egui::RichText::new(engine).weak());
                    ui.separator();
                    ui.label(format!("{:.0}%", self.spy.progress()));
                    ui.separator();
                    ui.label(format!("{} headings", self.rendered.outline.len()));
                    if let Some(active) = self.active_heading_text() {
                        ui.separator();
                        ui.label(active);
                    }
                });
            });
        });
    }

    fn active_heading_text(&self) -> Option<&str> {
        let idx = self.spy.active(self.config.lookahead)?;
        self.rendered.outline.get(idx).map(|entry| entry.text.as_str())
    }

    /// Blocking notice shown while no conversion engine is available
    fn render_engine_error(&mut self, ctx: &egui::Context) {
        let Some(error) = self.engine_error.clone() else {
            return;
        };

        let mut retry = false;
        egui::Modal::new(egui::Id::new("engine_error")).show(ctx, |ui| {
            ui.set_max_width(420.0);
            ui.heading("Markdown engine unavailable");
            ui.add_space(8.0);
            ui.label(&error);
            ui.add_space(8.0);
            ui.label("The previewer cannot render documents without an engine.");
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button(format!("Use {DEFAULT_ENGINE}")).clicked() {
                    retry = true;
                }
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });

        if retry {
            self.config.engine = DEFAULT_ENGINE.to_string();
            self.load_engine(DEFAULT_ENGINE);
            self.save_config();
        }
    }

    fn render_drop_overlay(&self, ctx: &egui::Context) {
        if !self.is_dragging {
            return;
        }

        let screen = ctx.screen_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_overlay"),
        ));
        painter.rect_filled(screen, 0.0, egui::Color32::from_black_alpha(160));
        painter.text(
            screen.center(),
            egui::Align2::CENTER_CENTER,
            "Drop a markdown file to preview it",
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_watcher();
        self.handle_dropped_files(ctx);

        let mut commands = ctx.input(Command::from_shortcuts);
        commands.extend(self.render_menu_bar(ctx));
        for command in commands {
            self.run(ctx, command);
        }

        if self.render_dirty {
            self.rerender();
        }

        self.render_status_bar(ctx);

        let view_mode = self.config.view_mode;
        if self.config.show_toc && view_mode != ViewMode::Editor {
            let active = self.spy.active_id(self.config.lookahead).map(str::to_string);
            egui::SidePanel::left("toc")
                .resizable(true)
                .default_width(220.0)
                .min_width(120.0)
                .show(ctx, |ui| {
                    if let Some(id) = TocPanel::show(ui, &self.rendered.outline, active.as_deref()) {
                        request_heading(&mut self.spy, &mut self.toasts, &id);
                    }
                });
        }

        // Render main content area
        egui::CentralPanel::default().show(ctx, |ui| match view_mode {
            ViewMode::Editor => EditorPanel::show(ui, self),
            ViewMode::Preview => PreviewPanel::show(ui, self),
            ViewMode::Split => {
                ui.columns(2, |columns| {
                    EditorPanel::show(&mut columns[0], self);
                    PreviewPanel::show(&mut columns[1], self);
                });
            }
        });

        self.render_engine_error(ctx);
        self.render_drop_overlay(ctx);
        self.toasts.show(ctx);
    }
}
