pub mod panels;
pub mod scene;

use std::collections::HashMap;

use egui::{Pos2, Rect, Sense, Vec2};
use instant::Instant;
use winit::window::Window;

use self::panels::{Panel, PANEL_MIN_HEIGHT, PANEL_WIDTH};
use self::scene::PetLayout;
use crate::cat::sprite::SpriteSet;
use crate::cat::Pose;
use crate::config::Settings;
use crate::hud::footer::FooterFade;
use crate::pet::Pet;
use crate::render::GpuState;
use crate::tray::{self, TrayCommand};

/// Something the user asked for that the app has to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Menu(TrayCommand),
    ApplySettings(Settings),
    /// Reset confirmed.
    ResetCount,
    /// Show the reset confirmation.
    AskReset,
    OpenConfig,
    ShowAchievements,
    DragWindow,
}

/// Per-frame data the overlay reads.
pub struct FrameInput<'a> {
    pub pet: &'a Pet,
    pub skins: &'a [String],
    pub visible: bool,
    pub now: Instant,
}

pub struct FrameOutput {
    pub primitives: Vec<egui::epaint::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen: egui_wgpu::ScreenDescriptor,
    pub actions: Vec<UiAction>,
    /// Logical window size this frame wants.
    pub desired_size: Vec2,
    /// Combo counter centre, relative to the cat's top-left.
    pub label_anchor: glam::Vec2,
    /// A fade, popup or panel still needs frames.
    pub animating: bool,
}

/// Mutable UI state drawn by the free [`draw`] function. Kept apart from the
/// egui context so `Context::run` can borrow it.
struct UiState {
    textures: HashMap<Pose, egui::TextureHandle>,
    cat_size: Vec2,
    footer: FooterFade,
    panel: Panel,
    confirm_reset: bool,
}

/// The pet window's egui layer.
pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    state: UiState,
}

impl Overlay {
    pub fn new(window: &Window, gpu: &GpuState, auto_hide_footer: bool) -> Self {
        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(egui::Visuals {
            panel_fill: scene::PANEL_BG,
            window_fill: scene::PANEL_BG,
            ..egui::Visuals::dark()
        });

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            state: UiState {
                textures: HashMap::new(),
                cat_size: Vec2::splat(crate::cat::sprite::PLACEHOLDER_SIZE as f32),
                footer: FooterFade::new(auto_hide_footer),
                panel: Panel::Closed,
                confirm_reset: false,
            },
        }
    }

    /// Upload the pose images of a (new) skin.
    pub fn set_sprites(&mut self, sprites: &SpriteSet) {
        let (w, h) = sprites.size();
        self.state.cat_size = Vec2::new(w as f32, h as f32);
        self.state.textures = Pose::ALL
            .into_iter()
            .map(|pose| {
                let img = sprites.get(pose);
                let size = [img.width() as usize, img.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                let handle = self.egui_ctx.load_texture(
                    format!("cat-{}", pose.key()),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                (pose, handle)
            })
            .collect();
        log::debug!("Uploaded cat textures at {w}x{h}");
    }

    pub fn set_auto_hide_footer(&mut self, auto_hide: bool, now: Instant) {
        self.state.footer.set_auto_hide(auto_hide, now);
    }

    pub fn open_settings(&mut self, current: &Settings) {
        if !matches!(self.state.panel, Panel::Settings(_)) {
            self.state.panel = Panel::Settings(Box::new(current.clone()));
        }
    }

    pub fn open_achievements(&mut self) {
        self.state.panel = Panel::Achievements;
    }

    pub fn ask_reset(&mut self) {
        self.state.confirm_reset = true;
    }

    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// Run the egui frame and tessellate its output.
    pub fn run_frame(&mut self, window: &Window, input: &FrameInput<'_>) -> FrameOutput {
        let raw_input = self.egui_state.take_egui_input(window);
        let hovering = raw_input
            .events
            .iter()
            .rev()
            .find_map(|e| match e {
                egui::Event::PointerMoved(_) => Some(true),
                egui::Event::PointerGone => Some(false),
                _ => None,
            });
        if let Some(hovering) = hovering {
            self.state.footer.set_hover(hovering, input.now);
        }
        self.state.footer.tick(input.now);

        let mut actions = Vec::new();
        let mut anchor = Pos2::ZERO;
        let state = &mut self.state;
        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            anchor = draw(ctx, state, input, &mut actions);
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);
        let size = window.inner_size();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point,
        };

        let layout = PetLayout::new(self.state.cat_size);
        let mut desired_size = layout.size();
        if self.state.panel.is_open() {
            desired_size.x += PANEL_WIDTH;
            desired_size.y = desired_size.y.max(PANEL_MIN_HEIGHT);
        }
        let anchor = anchor - layout.cat.min;

        FrameOutput {
            primitives,
            textures_delta: full_output.textures_delta,
            screen,
            actions,
            desired_size,
            label_anchor: glam::Vec2::new(anchor.x, anchor.y),
            animating: self.state.footer.is_animating()
                || self.state.panel.is_open()
                || self.state.confirm_reset,
        }
    }

    /// Upload egui textures and buffers. Call before the render pass.
    pub fn prepare(
        &mut self,
        gpu: &GpuState,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameOutput,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &frame.textures_delta.set {
            self.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        self.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &frame.primitives,
            &frame.screen,
        )
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'static>, frame: &FrameOutput) {
        self.egui_renderer
            .render(render_pass, &frame.primitives, &frame.screen);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Lay out and paint one frame. Returns the combo counter's centre in window
/// points.
fn draw(
    ctx: &egui::Context,
    state: &mut UiState,
    input: &FrameInput<'_>,
    actions: &mut Vec<UiAction>,
) -> Pos2 {
    let pet = input.pet;
    let settings = pet.settings();
    let layout = PetLayout::new(state.cat_size);

    if state.panel.is_open() {
        egui::SidePanel::right("side_panel")
            .exact_width(PANEL_WIDTH - 10.0)
            .resizable(false)
            .show(ctx, |ui| {
                let keep_open = match &mut state.panel {
                    Panel::Settings(draft) => panels::settings(ui, draft, input.skins, actions),
                    Panel::Achievements => panels::achievements(ui, pet.achievements()),
                    Panel::Closed => false,
                };
                if !keep_open {
                    state.panel = Panel::Closed;
                }
            });
    }

    if state.confirm_reset {
        match panels::confirm_reset(ctx) {
            Some(true) => {
                actions.push(UiAction::ResetCount);
                state.confirm_reset = false;
            }
            Some(false) => state.confirm_reset = false,
            None => {}
        }
    }

    let mut anchor = Pos2::ZERO;
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let painter = ui.painter().clone();
            let body = ui.interact(
                Rect::from_min_max(Pos2::ZERO, layout.cat.max),
                egui::Id::new("cat_body"),
                Sense::click_and_drag(),
            );
            if body.drag_started_by(egui::PointerButton::Primary) {
                actions.push(UiAction::DragWindow);
            }
            body.context_menu(|ui| context_menu(ui, input, actions));

            if let Some(texture) = state.textures.get(&pet.cat().pose()) {
                scene::paint_cat(
                    &painter,
                    layout.cat,
                    texture.id(),
                    pet.cat().stretch(),
                    settings.invert_cat,
                );
            }

            // Counters, top right.
            let total = settings
                .always_show_points
                .then(|| scene::total_galley(&painter, pet.slaps()));
            let label = pet.label_frame(input.now);
            let combo_size = label
                .as_ref()
                .map_or(Vec2::new(30.0, 20.0), |f| scene::combo_size(&painter, f));
            let (total_pos, combo_pos) = scene::label_positions(
                layout.cat.width(),
                total.as_ref().map(|g| scene::total_size(g.size())),
                combo_size,
            );
            if let (Some(galley), Some(pos)) = (total, total_pos) {
                scene::paint_total(&painter, pos, galley);
            }
            anchor = combo_pos + combo_size / 2.0;
            if let Some(frame) = &label {
                scene::paint_combo(&painter, anchor, frame);
            }

            scene::paint_popups(&painter, layout.cat.min, &pet.popups());

            if let Some((toast, alpha)) = pet.toasts().current(input.now) {
                scene::paint_toast(&painter, layout.cat, toast, alpha);
            }

            footer(ui, state, layout.footer, settings, pet.slaps(), actions);
        });
    anchor
}

fn footer(
    ui: &mut egui::Ui,
    state: &UiState,
    rect: Rect,
    settings: &Settings,
    slaps: u64,
    actions: &mut Vec<UiAction>,
) {
    let opacity = state.footer.opacity();
    if opacity <= 0.0 {
        return;
    }
    ui.painter().rect_filled(
        rect.shrink2(Vec2::new(2.0, 1.0)),
        12.0,
        scene::footer_fill(settings.footer_alpha_u8()).gamma_multiply(opacity),
    );
    let inner = rect.shrink2(Vec2::new(10.0, 0.0));
    ui.scope_builder(egui::UiBuilder::new().max_rect(inner), |ui| {
        ui.set_opacity(opacity);
        ui.horizontal_centered(|ui| {
            ui.label(
                egui::RichText::new(format!("✋ {slaps}"))
                    .color(egui::Color32::WHITE)
                    .strong(),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("📄").on_hover_text("Open config file").clicked() {
                    actions.push(UiAction::OpenConfig);
                }
                if ui.small_button("⚙ Settings").clicked() {
                    actions.push(UiAction::Menu(TrayCommand::OpenSettings));
                }
            });
        });
    });
}

fn context_menu(ui: &mut egui::Ui, input: &FrameInput<'_>, actions: &mut Vec<UiAction>) {
    for entry in tray::menu_entries(input.visible, input.pet.is_paused()) {
        match entry {
            Some((command, label)) => {
                if ui.button(label).clicked() {
                    actions.push(UiAction::Menu(command));
                    ui.close();
                }
                if command == TrayCommand::OpenSettings && ui.button("Achievements").clicked() {
                    actions.push(UiAction::ShowAchievements);
                    ui.close();
                }
            }
            None => {
                ui.separator();
            }
        }
    }
}
