use std::sync::Arc;
use std::time::Duration;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::achievements::Achievements;
use crate::cat::animation::IDLE_TICK;
use crate::cat::sprite::SpriteSet;
use crate::cat::Pose;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::{InputManager, InputSource};
use crate::paths::Paths;
use crate::pet::Pet;
use crate::platform;
use crate::render::{FrameContext, GpuState};
use crate::skin::{SkinManager, DEFAULT_SKIN};
use crate::sound::SoundManager;
use crate::startup;
use crate::tray::{TrayCommand, TrayIcon};
use crate::ui::scene::PetLayout;
use crate::ui::{FrameInput, Overlay, UiAction};

/// How often the loop wakes while nothing moves, to poll the tray.
const IDLE_POLL: Duration = Duration::from_millis(100);
const HIDDEN_TITLE: &str = "Bongo Cat";
const HIDDEN_BODY: &str = "Bongo Cat is still running in the system tray";

/// How often redraw timing is logged.
const STATS_WINDOW: Duration = Duration::from_secs(5);

/// Events posted to the UI thread from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Input(InputSource),
}

/// Redraw cadence over a rolling window, logged at debug level.
struct RedrawStats {
    window_start: Instant,
    redraws: u32,
    longest_gap: Duration,
    total: u64,
}

impl RedrawStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            redraws: 0,
            longest_gap: Duration::ZERO,
            total: 0,
        }
    }

    fn record(&mut self, gap: Duration, now: Instant) {
        self.redraws += 1;
        self.total += 1;
        self.longest_gap = self.longest_gap.max(gap);

        let span = now.saturating_duration_since(self.window_start);
        if span < STATS_WINDOW {
            return;
        }
        log::debug!(
            "{:.1} redraws/s, longest gap {}ms, {} total",
            self.redraws as f64 / span.as_secs_f64(),
            self.longest_gap.as_millis(),
            self.total,
        );
        *self = Self {
            window_start: now,
            total: self.total,
            ..Self::new()
        };
    }
}

struct App {
    proxy: EventLoopProxy<AppEvent>,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<Overlay>,
    tray: Option<TrayIcon>,

    pet: Pet,
    skins: SkinManager,
    skin_ids: Vec<String>,
    input: InputManager,

    visible: bool,
    /// The "still running" balloon is shown on the first hide only.
    hide_noticed: bool,
    /// Something besides breathing moved last frame.
    animating: bool,
    next_frame: Instant,
    last_redraw: Option<Instant>,
    redraw_stats: RedrawStats,

    /// Set when startup failed; returned from [`run`].
    fatal: Option<Error>,
}

impl App {
    fn new(paths: Paths, proxy: EventLoopProxy<AppEvent>) -> Self {
        let config = Config::load(paths.config_file());
        let achievements = Achievements::load(paths.achievements_file());
        let sound = SoundManager::new(
            &paths.sounds_dir(),
            config.settings.sound_enabled,
            config.settings.sound_volume,
        );

        let mut skins = SkinManager::discover(&paths.skins_dir(), paths.asset("img"));
        skins.load_or_fallback(&config.settings.skin);
        let mut skin_ids: Vec<String> = skins.ids().map(str::to_string).collect();
        if !skin_ids.iter().any(|id| id == DEFAULT_SKIN) {
            skin_ids.insert(0, DEFAULT_SKIN.to_string());
        }

        if config.settings.startup_with_windows {
            // Keep the registration pointing at this executable.
            startup::apply(true);
        }

        let mut pet = Pet::new(config, achievements, sound);
        pet.on_launch();

        Self {
            proxy,
            window: None,
            gpu: None,
            overlay: None,
            tray: None,
            pet,
            skins,
            skin_ids,
            input: InputManager::new(),
            visible: true,
            hide_noticed: false,
            animating: false,
            next_frame: Instant::now(),
            last_redraw: None,
            redraw_stats: RedrawStats::new(),
            fatal: None,
        }
    }

    fn load_sprites(&self) -> SpriteSet {
        SpriteSet::load(
            |pose| self.skins.image_path(pose),
            self.skins.rotation_degrees() as f32,
        )
    }

    /// Create the window, GPU surface and overlay. Returns the sprites the
    /// window was built from.
    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<SpriteSet> {
        let sprites = self.load_sprites();
        let (w, h) = sprites.size();
        let size = PetLayout::new(egui::vec2(w as f32, h as f32)).size();

        let attrs = platform::window_attributes(LogicalSize::new(size.x as f64, size.y as f64));
        let window = Arc::new(event_loop.create_window(attrs)?);
        platform::setup_overlay(&window);
        if let Some(monitor) = event_loop
            .primary_monitor()
            .or_else(|| window.current_monitor())
        {
            window.set_outer_position(platform::centred(
                monitor.position(),
                monitor.size(),
                window.outer_size(),
            ));
        }

        let gpu = GpuState::new(window.clone())?;
        let mut overlay = Overlay::new(&window, &gpu, self.pet.settings().hidden_footer);
        overlay.set_sprites(&sprites);
        self.pet.set_cat_size(glam::Vec2::new(w as f32, h as f32));

        log::info!(
            "Pet window created: {}x{} (skin '{}')",
            size.x,
            size.y,
            self.skins.current_skin_id()
        );

        // Shown only now so the compositor never caches an unstyled frame.
        window.set_visible(true);

        self.gpu = Some(gpu);
        self.overlay = Some(overlay);
        self.window = Some(window);
        Ok(sprites)
    }

    fn reload_skin(&mut self) {
        let id = self.pet.settings().skin.clone();
        self.skins.load_or_fallback(&id);
        let sprites = self.load_sprites();
        let (w, h) = sprites.size();
        if let Some(overlay) = &mut self.overlay {
            overlay.set_sprites(&sprites);
        }
        if let Some(tray) = &mut self.tray {
            tray.set_icon(sprites.get(Pose::Idle));
        }
        self.pet.set_cat_size(glam::Vec2::new(w as f32, h as f32));
        log::info!("Switched to skin '{}'", self.skins.current_skin_id());
    }

    fn slap(&mut self, source: InputSource) {
        if self.pet.slap(source, Instant::now()) {
            self.animating = true;
            if self.visible {
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Some(w) = &self.window {
            w.set_visible(visible);
        }
        self.sync_tray();
        if !visible && !self.hide_noticed {
            if let Some(tray) = &mut self.tray {
                tray.notify(HIDDEN_TITLE, HIDDEN_BODY);
                self.hide_noticed = true;
            }
        }
        log::info!("Window {}", if visible { "shown" } else { "hidden" });
    }

    fn sync_tray(&mut self) {
        if let Some(tray) = &mut self.tray {
            tray.set_state(self.visible, self.pet.is_paused());
        }
    }

    fn handle_command(&mut self, event_loop: &ActiveEventLoop, command: TrayCommand) {
        match command {
            TrayCommand::None => {}
            TrayCommand::ToggleVisible if self.visible && self.tray.is_none() => {
                log::info!("No tray icon to restore from; keeping the window shown");
            }
            TrayCommand::ToggleVisible => self.set_visible(!self.visible),
            TrayCommand::TogglePause => {
                let paused = !self.pet.is_paused();
                self.pet.set_paused(paused);
                self.sync_tray();
            }
            TrayCommand::OpenSettings => {
                self.set_visible(true);
                if let Some(overlay) = &mut self.overlay {
                    overlay.open_settings(self.pet.settings());
                }
            }
            TrayCommand::ResetCount => {
                self.set_visible(true);
                if let Some(overlay) = &mut self.overlay {
                    overlay.ask_reset();
                }
            }
            TrayCommand::Quit => {
                log::info!("Quit requested");
                event_loop.exit();
            }
        }
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: UiAction) {
        match action {
            UiAction::Menu(command) => self.handle_command(event_loop, command),
            UiAction::ApplySettings(settings) => {
                let delta = self.pet.apply_settings(settings);
                if delta.skin {
                    self.reload_skin();
                }
                if delta.footer {
                    let auto_hide = self.pet.settings().hidden_footer;
                    if let Some(overlay) = &mut self.overlay {
                        overlay.set_auto_hide_footer(auto_hide, Instant::now());
                    }
                }
                log::info!("Settings applied");
            }
            UiAction::ResetCount => self.pet.reset_count(),
            UiAction::AskReset => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.ask_reset();
                }
            }
            UiAction::OpenConfig => self.pet.open_config(),
            UiAction::ShowAchievements => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.open_achievements();
                }
            }
            UiAction::DragWindow => {
                if let Some(w) = &self.window {
                    if let Err(e) = w.drag_window() {
                        log::warn!("Window drag failed: {e}");
                    }
                }
            }
        }
    }

    /// Advance the pet and draw one frame. Returns what the user did.
    fn redraw(&mut self) -> Vec<UiAction> {
        let now = Instant::now();
        if let Some(last) = self.last_redraw.replace(now) {
            self.redraw_stats
                .record(now.saturating_duration_since(last), now);
        }
        self.pet.tick(now);

        let (Some(window), Some(gpu), Some(overlay)) =
            (&self.window, &self.gpu, &mut self.overlay)
        else {
            return Vec::new();
        };

        let frame = overlay.run_frame(
            window,
            &FrameInput {
                pet: &self.pet,
                skins: &self.skin_ids,
                visible: self.visible,
                now,
            },
        );

        let current: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
        if (current.width - frame.desired_size.x).abs() >= 1.0
            || (current.height - frame.desired_size.y).abs() >= 1.0
        {
            let _ = window.request_inner_size(LogicalSize::new(
                frame.desired_size.x as f64,
                frame.desired_size.y as f64,
            ));
        }

        if let Some(FrameContext {
            output,
            view,
            mut encoder,
        }) = gpu.begin_frame()
        {
            let extra = overlay.prepare(gpu, &mut encoder, &frame);
            {
                let mut pass = GpuState::begin_overlay_pass(&mut encoder, &view);
                overlay.render(&mut pass, &frame);
            }
            gpu.finish_frame(encoder, output, extra);
        }
        overlay.free_textures(&frame.textures_delta);

        self.pet.set_label_anchor(frame.label_anchor);
        self.animating = frame.animating || self.pet.is_animating();
        frame.actions
    }

    fn schedule_next_frame(&mut self, now: Instant) {
        let interval = if self.pet.is_paused() && !self.animating {
            IDLE_POLL
        } else {
            IDLE_TICK
        };
        self.next_frame = now + interval;
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let sprites = match self.init_window(event_loop) {
            Ok(sprites) => sprites,
            Err(e) => {
                log::error!("Could not create the pet window: {e}");
                self.fatal = Some(e);
                event_loop.exit();
                return;
            }
        };

        self.input.start(event_loop, self.proxy.clone());
        log::info!("Input listeners: {:?}", self.input.status());

        match TrayIcon::new(Some(sprites.get(Pose::Idle))) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => log::warn!("{e}; closing the window will quit"),
        }
        self.sync_tray();

        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Input(source) => self.slap(source),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(source) = self.input.handle_device_event(&event) {
            self.slap(source);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let command = self
            .tray
            .as_mut()
            .map_or(TrayCommand::None, |tray| tray.poll());
        self.handle_command(event_loop, command);

        let now = Instant::now();
        if now >= self.next_frame {
            if self.visible {
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            } else {
                // Keep timers running while hidden so combos still expire.
                self.pet.tick(now);
            }
            self.schedule_next_frame(now);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            if overlay.on_window_event(window, &event) {
                self.animating = true;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if self.tray.is_some() {
                    self.set_visible(false);
                } else {
                    log::info!("Close requested, exiting");
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                for action in self.redraw() {
                    self.handle_action(event_loop, action);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.input.stop(event_loop);
        self.pet.shutdown();
        self.tray = None;
        log::info!("Goodbye");
    }
}

pub fn run(paths: Paths) -> Result<()> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    log::info!("Config dir: {}", paths.config_dir.display());
    let mut app = App::new(paths, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;
    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
