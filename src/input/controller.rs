//! Gamepad listener.
//!
//! gilrs is polled on its own thread; every counted input is forwarded to the
//! UI thread as an [`AppEvent`]. Edge detection lives in [`PadEdges`] so it
//! can be driven without hardware.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use gilrs::{Axis, Button, EventType, Gilrs};
use winit::event_loop::EventLoopProxy;

use super::InputSource;
use crate::app::AppEvent;
use crate::error::{Error, Result};

/// Trigger counts once pulled past this...
const TRIGGER_PRESS: f32 = 0.5;
/// ...and re-arms once released below this.
const TRIGGER_RELEASE: f32 = 0.1;
/// Stick counts when flicked past this from inside the dead zone.
const STICK_PRESS: f32 = 0.7;
const STICK_DEAD_ZONE: f32 = 0.3;
/// How long one blocking poll waits before re-checking the stop flag.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Control identity: (gamepad, element code).
type Control = (usize, u32);

/// One normalised controller reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadInput {
    Button { control: Control, pressed: bool },
    Trigger { control: Control, value: f32 },
    Stick { control: Control, value: f32 },
    /// D-pad reported as an axis; `dir` is -1, 0 or 1.
    Hat { control: Control, dir: i8 },
}

/// Turns raw controller readings into discrete "slaps".
#[derive(Debug, Default)]
pub struct PadEdges {
    buttons: HashSet<Control>,
    triggers: HashSet<Control>,
    sticks: HashSet<(Control, i8)>,
    last_stick: HashMap<Control, f32>,
    hats: HashSet<(Control, i8)>,
}

impl PadEdges {
    /// Feed one reading. True when it counts as a new input.
    pub fn feed(&mut self, input: PadInput) -> bool {
        match input {
            PadInput::Button { control, pressed } => {
                if pressed {
                    self.buttons.insert(control)
                } else {
                    self.buttons.remove(&control);
                    false
                }
            }
            PadInput::Trigger { control, value } => {
                if value > TRIGGER_PRESS {
                    self.triggers.insert(control)
                } else {
                    if value < TRIGGER_RELEASE {
                        self.triggers.remove(&control);
                    }
                    false
                }
            }
            PadInput::Stick { control, value } => {
                let prev = self.last_stick.insert(control, value).unwrap_or(0.0);
                let key = (control, if value > 0.0 { 1 } else { -1 });
                if value.abs() > STICK_PRESS && prev.abs() < STICK_DEAD_ZONE {
                    self.sticks.insert(key)
                } else {
                    if value.abs() < STICK_DEAD_ZONE {
                        self.sticks.remove(&key);
                    }
                    false
                }
            }
            PadInput::Hat { control, dir } => {
                if dir != 0 {
                    self.hats.insert((control, dir))
                } else {
                    self.hats.retain(|(c, _)| *c != control);
                    false
                }
            }
        }
    }

    /// Forget everything about a gamepad that went away.
    pub fn disconnect(&mut self, pad: usize) {
        self.buttons.retain(|(p, _)| *p != pad);
        self.triggers.retain(|(p, _)| *p != pad);
        self.sticks.retain(|((p, _), _)| *p != pad);
        self.last_stick.retain(|(p, _), _| *p != pad);
        self.hats.retain(|((p, _), _)| *p != pad);
    }
}

fn is_trigger_button(button: Button) -> bool {
    matches!(button, Button::LeftTrigger2 | Button::RightTrigger2)
}

/// Map a gilrs event onto a [`PadInput`]. Events that carry no input
/// (connection changes, analog repeats of digital buttons) map to `None`.
fn normalise(pad: usize, event: EventType) -> Option<PadInput> {
    match event {
        // Analog triggers arrive as ButtonChanged; their digital press would
        // double count.
        EventType::ButtonPressed(button, code) if !is_trigger_button(button) => {
            Some(PadInput::Button {
                control: (pad, code.into_u32()),
                pressed: true,
            })
        }
        EventType::ButtonReleased(button, code) if !is_trigger_button(button) => {
            Some(PadInput::Button {
                control: (pad, code.into_u32()),
                pressed: false,
            })
        }
        EventType::ButtonChanged(button, value, code) if is_trigger_button(button) => {
            Some(PadInput::Trigger {
                control: (pad, code.into_u32()),
                value,
            })
        }
        EventType::AxisChanged(axis, value, code) => {
            let control = (pad, code.into_u32());
            match axis {
                Axis::LeftZ | Axis::RightZ => Some(PadInput::Trigger { control, value }),
                Axis::DPadX | Axis::DPadY => Some(PadInput::Hat {
                    control,
                    dir: if value > 0.5 {
                        1
                    } else if value < -0.5 {
                        -1
                    } else {
                        0
                    },
                }),
                _ => Some(PadInput::Stick { control, value }),
            }
        }
        _ => None,
    }
}

/// Handle to the polling thread.
pub struct ControllerListener {
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ControllerListener {
    /// Start polling. Fails when no gamepad backend is available; keyboard
    /// and mouse input are unaffected.
    pub fn start(proxy: EventLoopProxy<AppEvent>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<(), String>>(1);

        let thread = {
            let stop = stop.clone();
            let running = running.clone();
            std::thread::Builder::new()
                .name("controller".into())
                .spawn(move || {
                    // Gilrs is not Send on every platform, so it is built here.
                    let mut gilrs = match Gilrs::new() {
                        Ok(g) => g,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                    running.store(true, Ordering::Release);
                    let _ = ready_tx.send(Ok(()));
                    poll_loop(&mut gilrs, &proxy, &stop);
                    running.store(false, Ordering::Release);
                })
                .map_err(|e| Error::Gamepad(e.to_string()))?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("Controller listener started");
                Ok(Self {
                    stop,
                    running,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(Error::Gamepad(e))
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Gamepad("controller thread exited".into()))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            log::info!("Controller listener stopped");
        }
    }
}

impl Drop for ControllerListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(gilrs: &mut Gilrs, proxy: &EventLoopProxy<AppEvent>, stop: &AtomicBool) {
    let mut edges = PadEdges::default();
    for (id, pad) in gilrs.gamepads() {
        log::info!("Gamepad {}: {}", usize::from(id), pad.name());
    }

    while !stop.load(Ordering::Acquire) {
        let Some(event) = gilrs.next_event_blocking(Some(POLL_TIMEOUT)) else {
            continue;
        };
        let pad = usize::from(event.id);
        match event.event {
            EventType::Connected => log::info!("Gamepad {pad} connected"),
            EventType::Disconnected => {
                log::info!("Gamepad {pad} disconnected");
                edges.disconnect(pad);
            }
            other => {
                let counted = normalise(pad, other).is_some_and(|input| edges.feed(input));
                if counted && proxy.send_event(AppEvent::Input(InputSource::Controller)).is_err() {
                    // Event loop is gone.
                    break;
                }
            }
        }
    }
}
