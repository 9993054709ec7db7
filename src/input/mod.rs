pub mod controller;
pub mod keyboard;

use winit::event::DeviceEvent;
use winit::event_loop::{ActiveEventLoop, DeviceEvents, EventLoopProxy};

use crate::app::AppEvent;
use controller::ControllerListener;
use keyboard::KeyTracker;

/// Where a slap came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Mouse,
    Controller,
}

/// Running state of each listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerStatus {
    pub keyboard: bool,
    pub mouse: bool,
    pub controller: bool,
}

impl ListenerStatus {
    pub fn any(&self) -> bool {
        self.keyboard || self.mouse || self.controller
    }
}

/// Global keyboard, mouse and gamepad activity.
///
/// Keyboard and mouse come from winit raw device events, which arrive even
/// when the overlay is not focused. Gamepads are polled on a background
/// thread that posts back through the event loop.
#[derive(Default)]
pub struct InputManager {
    keys: KeyTracker,
    listening: bool,
    controller: Option<ControllerListener>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, event_loop: &ActiveEventLoop, proxy: EventLoopProxy<AppEvent>) {
        log::info!("Starting input listeners");
        event_loop.listen_device_events(DeviceEvents::Always);
        self.listening = true;

        match ControllerListener::start(proxy) {
            Ok(listener) => self.controller = Some(listener),
            Err(e) => log::warn!("{e}; controller input disabled"),
        }
    }

    pub fn stop(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Stopping input listeners");
        event_loop.listen_device_events(DeviceEvents::Never);
        self.listening = false;
        self.keys.clear();
        if let Some(mut controller) = self.controller.take() {
            controller.stop();
        }
    }

    /// Classify a raw device event. Returns the source when it counts as a
    /// slap.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> Option<InputSource> {
        if !self.listening {
            return None;
        }
        match event {
            DeviceEvent::Key(raw) => self.keys.handle(raw).then_some(InputSource::Keyboard),
            _ if keyboard::is_mouse_press(event) => Some(InputSource::Mouse),
            _ => None,
        }
    }

    pub fn status(&self) -> ListenerStatus {
        ListenerStatus {
            keyboard: self.listening,
            mouse: self.listening,
            controller: self.controller.as_ref().is_some_and(|c| c.is_running()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{ElementState, RawKeyEvent};
    use winit::keyboard::{KeyCode, PhysicalKey};

    fn key(state: ElementState) -> DeviceEvent {
        DeviceEvent::Key(RawKeyEvent {
            physical_key: PhysicalKey::Code(KeyCode::Space),
            state,
        })
    }

    #[test]
    fn idle_manager_ignores_events() {
        let mut input = InputManager::new();
        assert_eq!(input.handle_device_event(&key(ElementState::Pressed)), None);
        assert!(!input.status().any());
    }

    #[test]
    fn classifies_sources() {
        let mut input = InputManager {
            listening: true,
            ..Default::default()
        };
        assert_eq!(
            input.handle_device_event(&key(ElementState::Pressed)),
            Some(InputSource::Keyboard)
        );
        assert_eq!(input.handle_device_event(&key(ElementState::Pressed)), None);
        assert_eq!(
            input.handle_device_event(&DeviceEvent::Button {
                button: 0,
                state: ElementState::Pressed
            }),
            Some(InputSource::Mouse)
        );
        assert_eq!(
            input.handle_device_event(&DeviceEvent::MouseMotion { delta: (1.0, 0.0) }),
            None
        );

        let status = input.status();
        assert!(status.keyboard && status.mouse && !status.controller);
    }
}
