use glam::Vec2;
use instant::Instant;

/// Label anchor in window pixels (top-left of the text).
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Current opacity in [0.0, 1.0].
#[derive(Debug, Clone, Copy)]
pub struct Opacity(pub f32);

/// Floating "+1" that rises from the cat after a slap.
#[derive(Debug, Clone, Copy)]
pub struct Popup {
    pub from: Vec2,
    pub to: Vec2,
    pub born: Instant,
    /// Opacity at the end of the flight.
    pub end_opacity: f32,
    /// Flies into the combo counter and makes it pop on arrival.
    pub merges: bool,
}

/// Popup text. Kept separate so the render pass can query labels alone.
#[derive(Debug, Clone)]
pub struct Label(pub &'static str);
