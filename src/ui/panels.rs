//! Side panels: settings and achievements, plus the reset confirmation.

use egui::{Color32, RichText};

use crate::achievements::{Achievements, Category};
use crate::config::Settings;
use crate::ui::UiAction;

/// Width of an open side panel, separator included.
pub const PANEL_WIDTH: f32 = 310.0;
/// The window is at least this tall while a panel is open.
pub const PANEL_MIN_HEIGHT: f32 = 450.0;

const RED: Color32 = Color32::from_rgb(0xe7, 0x4c, 0x3c);
const GREEN: Color32 = Color32::from_rgb(0x2e, 0xcc, 0x71);
const BLUE: Color32 = Color32::from_rgb(0x34, 0x98, 0xdb);

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Closed,
    /// Settings being edited; nothing is applied until Apply.
    Settings(Box<Settings>),
    Achievements,
}

impl Panel {
    pub fn is_open(&self) -> bool {
        !matches!(self, Panel::Closed)
    }
}

fn coloured_button(ui: &mut egui::Ui, text: &str, fill: Color32) -> egui::Response {
    ui.add(egui::Button::new(RichText::new(text).color(Color32::WHITE)).fill(fill))
}

pub fn settings(
    ui: &mut egui::Ui,
    draft: &mut Settings,
    skins: &[String],
    actions: &mut Vec<UiAction>,
) -> bool {
    let mut keep_open = true;

    ui.vertical_centered(|ui| ui.heading("Settings"));
    ui.separator();

    egui::Grid::new("settings_grid")
        .num_columns(2)
        .spacing([12.0, 10.0])
        .show(ui, |ui| {
            ui.label("Auto-hide footer:");
            ui.checkbox(&mut draft.hidden_footer, "");
            ui.end_row();

            ui.label("Footer opacity:");
            ui.add(egui::Slider::new(&mut draft.footer_alpha, 0..=100).suffix("%"));
            ui.end_row();

            ui.label("Always show total:");
            ui.checkbox(&mut draft.always_show_points, "");
            ui.end_row();

            ui.label("Floating +1 animations:");
            ui.checkbox(&mut draft.floating_points, "");
            ui.end_row();

            ui.label("Invert cat:");
            ui.checkbox(&mut draft.invert_cat, "");
            ui.end_row();

            ui.label("Start with system:");
            ui.checkbox(&mut draft.startup_with_windows, "");
            ui.end_row();

            ui.label("Max slap count:");
            ui.add(
                egui::DragValue::new(&mut draft.max_slaps)
                    .range(0..=1_000_000)
                    .custom_formatter(|n, _| {
                        if n == 0.0 {
                            "No limit".to_string()
                        } else {
                            format!("{n:.0}")
                        }
                    }),
            );
            ui.end_row();

            ui.label("Skin:");
            egui::ComboBox::from_id_salt("skin")
                .selected_text(draft.skin.as_str())
                .show_ui(ui, |ui| {
                    for id in skins {
                        ui.selectable_value(&mut draft.skin, id.clone(), id.as_str());
                    }
                });
            ui.end_row();

            ui.label("Sound effects:");
            ui.checkbox(&mut draft.sound_enabled, "");
            ui.end_row();

            ui.label("Volume:");
            ui.add_enabled(
                draft.sound_enabled,
                egui::Slider::new(&mut draft.sound_volume, 0..=100).suffix("%"),
            );
            ui.end_row();
        });

    ui.add_space(8.0);
    if ui.link("Open config file").clicked() {
        actions.push(UiAction::OpenConfig);
    }
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        if coloured_button(ui, "Reset Counter", RED).clicked() {
            actions.push(UiAction::AskReset);
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if coloured_button(ui, "Close", BLUE).clicked() {
                keep_open = false;
            }
            if coloured_button(ui, "Apply", GREEN).clicked() {
                actions.push(UiAction::ApplySettings(draft.clone()));
            }
        });
    });

    keep_open
}

fn category_rows(ui: &mut egui::Ui, achievements: &Achievements, category: Category) {
    ui.label(RichText::new(category.label()).strong().size(15.0));
    for a in achievements
        .all()
        .iter()
        .filter(|a| a.def.category == category)
    {
        let icon = if a.unlocked {
            a.def.icon
        } else if a.def.hidden {
            "❓"
        } else {
            "🔒"
        };
        let colour = if a.unlocked {
            Color32::WHITE
        } else {
            Color32::from_gray(140)
        };
        ui.horizontal(|ui| {
            ui.label(RichText::new(icon).size(18.0));
            ui.vertical(|ui| {
                ui.label(RichText::new(a.display_name()).color(colour).strong());
                ui.label(RichText::new(a.display_description()).color(colour).small());
            });
        });
    }
    ui.add_space(6.0);
}

pub fn achievements(ui: &mut egui::Ui, achievements: &Achievements) -> bool {
    let mut keep_open = true;

    ui.vertical_centered(|ui| ui.heading("Achievements"));
    ui.separator();

    let total = achievements.all().len();
    let pct = achievements.progress_percent();
    ui.label(format!(
        "{} / {total} unlocked ({pct:.0}%)",
        achievements.unlocked_count()
    ));
    ui.add(egui::ProgressBar::new(pct / 100.0).fill(GREEN));
    ui.add_space(6.0);

    let footer = 36.0;
    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - footer).max(50.0))
        .show(ui, |ui| {
            for category in [Category::Slaps, Category::Combos, Category::Special] {
                category_rows(ui, achievements, category);
            }
        });

    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        if coloured_button(ui, "Close", BLUE).clicked() {
            keep_open = false;
        }
    });
    keep_open
}

/// Reset confirmation. Returns `Some(true)` to reset, `Some(false)` to
/// cancel, `None` while undecided.
pub fn confirm_reset(ctx: &egui::Context) -> Option<bool> {
    let mut answer = None;
    let modal = egui::Modal::new(egui::Id::new("confirm_reset")).show(ctx, |ui| {
        ui.set_width(220.0);
        ui.heading("Reset Counter");
        ui.label("Are you sure you want to reset the slap counter to 0?");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if coloured_button(ui, "Yes", RED).clicked() {
                answer = Some(true);
            }
            if ui.button("No").clicked() {
                answer = Some(false);
            }
        });
    });
    if answer.is_none() && modal.should_close() {
        answer = Some(false);
    }
    answer
}
