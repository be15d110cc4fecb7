use super::{build_portal, APP_NAME};
use bookshelf_common::init_tracing;
use bookshelf_portal::{
    catalog::{CatalogView, LOAD_ERROR_DETAIL, LOAD_ERROR_TITLE, RETRY_LABEL},
    form::{FieldStatus, PREFERENCE_OPTIONS},
    load_config,
    notice::NoticeKind,
    theme::Theme,
    validators::FieldKind,
    Portal, PortalConfig, PortalState,
};
use eframe::egui;
use std::{
    sync::Arc,
    time::Instant,
};

pub fn run() {
    let _guards = init_tracing(APP_NAME);

    let config = load_config().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config, using defaults");
        PortalConfig::default()
    });
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start tokio runtime");
            return;
        }
    };
    let portal = match build_portal(config) {
        Ok(portal) => portal,
        Err(err) => {
            tracing::error!(error = %err, "failed to build http client");
            return;
        }
    };
    let runtime = Arc::new(runtime);
    {
        let _enter = runtime.enter();
        portal.start();
    }

    let app = PortalGui {
        portal: portal.clone(),
        runtime: runtime.clone(),
    };
    let options = eframe::NativeOptions::default();
    if let Err(err) = eframe::run_native("Bookshelf", options, Box::new(|_cc| Ok(Box::new(app)))) {
        tracing::error!(error = %err, "window closed with error");
    }
    runtime.block_on(portal.stop());
}

struct PortalGui {
    portal: Portal,
    runtime: Arc<tokio::runtime::Runtime>,
}

fn hex_color(hex: &str) -> egui::Color32 {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
            .unwrap_or(0)
    };
    egui::Color32::from_rgb(channel(1..3), channel(3..5), channel(5..7))
}

impl PortalGui {
    fn field_row(&self, ui: &mut egui::Ui, state: &PortalState, kind: FieldKind) {
        let field = state.form.field(kind);
        let mut value = field.raw_value.clone();
        ui.label(kind.label());
        ui.horizontal(|ui| {
            let mut edit = egui::TextEdit::singleline(&mut value).desired_width(280.0);
            match kind {
                FieldKind::Password | FieldKind::ConfirmPassword => edit = edit.password(true),
                FieldKind::Phone => edit = edit.hint_text("+7 (XXX) XXX-XX-XX"),
                FieldKind::Birthdate => edit = edit.hint_text("ГГГГ-ММ-ДД"),
                _ => {}
            }
            if ui.add(edit).changed() {
                self.runtime.block_on(self.portal.input(kind, &value));
            }
            match field.status {
                FieldStatus::Valid => {
                    ui.colored_label(hex_color("#4cc9f0"), "✔");
                }
                FieldStatus::Invalid => {
                    ui.colored_label(hex_color("#f72585"), "✖");
                }
                FieldStatus::Untouched => {}
            }
        });
        if !field.message.is_empty() {
            ui.colored_label(hex_color("#f72585"), &field.message);
        }
    }

    fn form_panel(&self, ui: &mut egui::Ui, state: &PortalState) {
        ui.heading("Регистрация читателя");
        ui.add_space(8.0);

        for kind in FieldKind::ALL {
            self.field_row(ui, state, kind);
            if kind == FieldKind::Password {
                let strength = state.form.strength();
                ui.add(
                    egui::ProgressBar::new(f32::from(strength.percent()) / 100.0)
                        .desired_width(280.0)
                        .fill(hex_color(strength.color())),
                );
            }
            ui.add_space(4.0);
        }

        ui.label("Любимые жанры");
        for (value, label) in PREFERENCE_OPTIONS {
            let mut selected = state.form.preferences().contains(value);
            if ui.checkbox(&mut selected, label).changed() {
                self.runtime
                    .block_on(self.portal.set_preference(value, selected));
            }
        }

        ui.add_space(4.0);
        ui.label("О себе");
        let mut bio = state.form.bio().value().to_string();
        if ui
            .add(egui::TextEdit::multiline(&mut bio).desired_rows(4).desired_width(280.0))
            .changed()
        {
            self.runtime.block_on(self.portal.set_bio(&bio));
        }
        ui.label(format!("Осталось символов: {}", state.form.bio().remaining()));

        let mut newsletter = state.form.newsletter();
        if ui
            .checkbox(&mut newsletter, "Получать рассылку о новинках")
            .changed()
        {
            self.runtime.block_on(self.portal.set_newsletter(newsletter));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let button = state.form.submit_button();
            if ui
                .add_enabled(button.is_enabled(), egui::Button::new(button.label()))
                .clicked()
            {
                let portal = self.portal.clone();
                self.runtime.spawn(async move {
                    portal.submit().await;
                });
            }
            if ui.button("Сбросить").clicked() {
                self.runtime.block_on(self.portal.reset_form());
            }
        });

        if let Some(notice) = state.notices.visible(Instant::now()) {
            let color = match notice.kind {
                NoticeKind::Success => hex_color("#38b000"),
                NoticeKind::Error => hex_color("#f72585"),
            };
            ui.add_space(6.0);
            ui.colored_label(color, &notice.message);
        }
    }

    fn catalog_panel(&self, ui: &mut egui::Ui, state: &PortalState) {
        ui.horizontal(|ui| {
            ui.heading("Книги клуба");
            if ui.button("⟳").on_hover_text("Обновить").clicked() {
                self.spawn_retry();
            }
        });
        ui.label(state.countdown.to_string());
        if let Some(stamp) = state.catalog.last_updated() {
            ui.label(format!("Последнее обновление: {stamp}"));
        }
        ui.add_space(8.0);

        if state.catalog.spinner_visible() {
            ui.add(egui::Spinner::new());
        }
        match state.catalog.view() {
            CatalogView::Empty => {}
            CatalogView::Failed => {
                ui.label(egui::RichText::new(LOAD_ERROR_TITLE).strong());
                ui.label(LOAD_ERROR_DETAIL);
                if ui.button(RETRY_LABEL).clicked() {
                    self.spawn_retry();
                }
            }
            CatalogView::Items(cards) => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for card in cards {
                        egui::Frame::none()
                            .fill(hex_color(card.cover.0).gamma_multiply(0.15))
                            .stroke(egui::Stroke::new(1.0, hex_color(card.cover.1)))
                            .rounding(8.0)
                            .inner_margin(10.0)
                            .show(ui, |ui| {
                                ui.label(egui::RichText::new(&card.title).strong().size(16.0));
                                ui.label(&card.author);
                                ui.horizontal(|ui| {
                                    ui.label(&card.price);
                                    ui.label(format!("★ {}", card.rating));
                                });
                                ui.label(&card.excerpt);
                                ui.horizontal_wrapped(|ui| {
                                    for tag in &card.tags {
                                        ui.small(tag);
                                    }
                                });
                            });
                        ui.add_space(6.0);
                    }
                });
            }
        }
    }

    fn spawn_retry(&self) {
        let portal = self.portal.clone();
        self.runtime.spawn(async move {
            portal.retry().await;
        });
    }
}

impl eframe::App for PortalGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = self.runtime.block_on(self.portal.snapshot());
        ctx.set_visuals(match state.theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        });

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Bookshelf");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(state.theme.glyph()).clicked() {
                        self.runtime.block_on(self.portal.toggle_theme());
                    }
                });
            });
        });

        egui::SidePanel::left("form_panel")
            .resizable(false)
            .min_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.form_panel(ui, &state));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.catalog_panel(ui, &state));

        if state.modal.is_open() {
            let mut open = true;
            let mut confirmed = false;
            egui::Window::new("Регистрация завершена")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    egui::Grid::new("modal_lines").num_columns(2).show(ui, |ui| {
                        for (label, value) in state.modal.lines() {
                            ui.label(egui::RichText::new(*label).strong());
                            ui.label(value);
                            ui.end_row();
                        }
                    });
                    if ui.button("OK").clicked() {
                        confirmed = true;
                    }
                });
            if !open || confirmed {
                self.runtime.block_on(self.portal.close_modal());
            }
        }

        ctx.request_repaint_after(self.portal.config().countdown_tick);
    }
}
