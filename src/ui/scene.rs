//! Painting the pet: cat sprite, counters, "+1"s, toast and footer.
//!
//! Everything is drawn with the egui painter in window-local points. The cat
//! sits below a strip of headroom that leaves space for the breathing
//! stretch, with the footer underneath.

use egui::{Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Vec2};

use crate::cat::animation::{StretchLayout, FIXED_BOTTOM, MAX_STRETCH};
use crate::hud::combo_label::LabelFrame;
use crate::hud::footer::FOOTER_HEIGHT;
use crate::hud::toast::Toast;
use crate::pet::PopupFrame;

/// Gap between the counters and the window's top-right corner.
pub const LABEL_MARGIN: f32 = 10.0;
/// Vertical gap between the total and the combo counter.
pub const LABEL_GAP: f32 = 5.0;
/// Total counter never gets narrower than this.
pub const TOTAL_MIN_WIDTH: f32 = 50.0;
pub const TOTAL_FONT: f32 = 14.0;
const TOTAL_PADDING: Vec2 = Vec2::new(12.0, 4.0);
pub const POPUP_FONT: f32 = 14.0;
/// Drop shadow offset for the "+1"s.
const SHADOW_OFFSET: Vec2 = Vec2::new(2.0, 2.0);

pub const POPUP_COLOR: Color32 = Color32::from_rgba_premultiplied(233, 233, 233, 242);
pub const PANEL_BG: Color32 = Color32::from_rgb(0x2c, 0x3e, 0x50);
const CHIP_BG: Color32 = Color32::from_rgba_premultiplied(34, 37, 44, 217);

/// Where the cat and footer go inside the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetLayout {
    pub cat: Rect,
    pub footer: Rect,
}

impl PetLayout {
    pub fn new(cat_size: Vec2) -> Self {
        let top = headroom(cat_size.y);
        let cat = Rect::from_min_size(Pos2::new(0.0, top), cat_size);
        let footer = Rect::from_min_size(
            Pos2::new(0.0, cat.bottom()),
            Vec2::new(cat_size.x, FOOTER_HEIGHT),
        );
        Self { cat, footer }
    }

    /// Window size needed for the pet alone.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.cat.width(), self.footer.bottom())
    }
}

/// Space above the sprite so the top of a full breath is not clipped.
pub fn headroom(h: f32) -> f32 {
    let stretchable = h - (h * FIXED_BOTTOM).floor();
    (stretchable * (MAX_STRETCH - 1.0)).ceil()
}

/// Top-left corners of the total counter (when shown) and the combo counter.
pub fn label_positions(
    window_w: f32,
    total: Option<Vec2>,
    combo: Vec2,
) -> (Option<Pos2>, Pos2) {
    let top = Pos2::new(0.0, LABEL_MARGIN);
    match total {
        Some(size) => {
            let w = size.x.max(TOTAL_MIN_WIDTH);
            let total_pos = Pos2::new(window_w - w - LABEL_MARGIN, top.y);
            let combo_pos = Pos2::new(
                window_w - combo.x - LABEL_MARGIN,
                top.y + size.y + LABEL_GAP,
            );
            (Some(total_pos), combo_pos)
        }
        None => (None, Pos2::new(window_w - combo.x - LABEL_MARGIN, top.y)),
    }
}

/// Draw the sprite with its top part stretched upward from the split line.
/// `mirror` flips it horizontally.
pub fn paint_cat(
    painter: &Painter,
    rect: Rect,
    texture: egui::TextureId,
    stretch: f32,
    mirror: bool,
) {
    let layout = StretchLayout::new(rect.height(), stretch);
    let (u0, u1) = if mirror { (1.0, 0.0) } else { (0.0, 1.0) };
    let y = |v: f32| rect.top() + v;

    let mut mesh = Mesh::with_texture(texture);
    mesh.add_rect_with_uv(
        Rect::from_x_y_ranges(rect.x_range(), y(layout.top_y)..=y(layout.split_y)),
        Rect::from_min_max(Pos2::new(u0, 0.0), Pos2::new(u1, layout.split_v)),
        Color32::WHITE,
    );
    mesh.add_rect_with_uv(
        Rect::from_x_y_ranges(rect.x_range(), y(layout.split_y)..=y(layout.bottom_y)),
        Rect::from_min_max(Pos2::new(u0, layout.split_v), Pos2::new(u1, 1.0)),
        Color32::WHITE,
    );
    painter.add(Shape::mesh(mesh));
}

/// The total-slaps chip. Returns its rect.
pub fn paint_total(painter: &Painter, pos: Pos2, galley: std::sync::Arc<egui::Galley>) -> Rect {
    let size = galley.size() + TOTAL_PADDING * 2.0;
    let rect = Rect::from_min_size(pos, Vec2::new(size.x.max(TOTAL_MIN_WIDTH), size.y));
    painter.rect_filled(rect, 8.0, CHIP_BG);
    let text_pos = rect.center() - galley.size() / 2.0;
    painter.galley(text_pos, galley, Color32::WHITE);
    rect
}

pub fn total_galley(painter: &Painter, slaps: u64) -> std::sync::Arc<egui::Galley> {
    painter.layout_no_wrap(slaps.to_string(), FontId::proportional(TOTAL_FONT), Color32::WHITE)
}

/// Padded size of the total chip for a galley of `text` size.
pub fn total_size(text: Vec2) -> Vec2 {
    text + TOTAL_PADDING * 2.0
}

/// Size of the combo counter at rest, before scale.
pub fn combo_size(painter: &Painter, frame: &LabelFrame) -> Vec2 {
    painter
        .layout_no_wrap(
            format!("+{}", frame.count),
            FontId::proportional(frame.font_size),
            Color32::WHITE,
        )
        .size()
}

/// Draw the combo counter centred on `anchor` plus the frame's offset.
pub fn paint_combo(painter: &Painter, anchor: Pos2, frame: &LabelFrame) {
    let [r, g, b] = frame.rgb;
    let alpha = (frame.opacity.clamp(0.0, 1.0) * 255.0) as u8;
    let font = FontId::proportional(frame.font_size * frame.scale.max(0.01));
    let text = format!("+{}", frame.count);
    let centre = anchor + egui::vec2(frame.offset.x, frame.offset.y);

    painter.text(
        centre,
        Align2::CENTER_CENTER,
        &text,
        font.clone(),
        Color32::from_black_alpha((alpha as f32 * 0.8) as u8),
    );
    painter.text(
        centre - Vec2::splat(1.0),
        Align2::CENTER_CENTER,
        &text,
        font,
        Color32::from_rgba_unmultiplied(r, g, b, alpha),
    );
}

/// Draw the in-flight "+1"s. Positions are relative to `origin`.
pub fn paint_popups(painter: &Painter, origin: Pos2, popups: &[PopupFrame]) {
    let font = FontId::proportional(POPUP_FONT);
    for popup in popups {
        let pos = origin + egui::vec2(popup.pos.x, popup.pos.y);
        let alpha = popup.opacity.clamp(0.0, 1.0);
        painter.text(
            pos + SHADOW_OFFSET,
            Align2::CENTER_TOP,
            popup.text,
            font.clone(),
            Color32::from_black_alpha(217).gamma_multiply(alpha),
        );
        painter.text(
            pos,
            Align2::CENTER_TOP,
            popup.text,
            font.clone(),
            POPUP_COLOR.gamma_multiply(alpha),
        );
    }
}

/// Achievement banner along the bottom of the cat.
pub fn paint_toast(painter: &Painter, cat: Rect, toast: &Toast, alpha: f32) {
    let rect = Rect::from_min_max(
        Pos2::new(cat.left() + 6.0, cat.bottom() - 46.0),
        Pos2::new(cat.right() - 6.0, cat.bottom() - 4.0),
    );
    painter.rect_filled(rect, 8.0, CHIP_BG.gamma_multiply(alpha));
    painter.text(
        Pos2::new(rect.left() + 8.0, rect.top() + 5.0),
        Align2::LEFT_TOP,
        format!("{} {}", toast.icon, toast.title),
        FontId::proportional(13.0),
        Color32::from_rgb(255, 215, 0).gamma_multiply(alpha),
    );
    painter.text(
        Pos2::new(rect.left() + 8.0, rect.bottom() - 5.0),
        Align2::LEFT_BOTTOM,
        &toast.description,
        FontId::proportional(11.0),
        Color32::from_gray(220).gamma_multiply(alpha),
    );
}

/// Footer background; `alpha` is the configured 0..=255 opacity.
pub fn footer_fill(alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(40, 44, 52, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_fits_a_full_breath() {
        let h = 200.0;
        let layout = StretchLayout::new(h, MAX_STRETCH);
        assert!(layout.top_y + headroom(h) >= 0.0);
        assert_eq!(headroom(0.0), 0.0);
    }

    #[test]
    fn pet_layout_stacks_cat_and_footer() {
        let layout = PetLayout::new(Vec2::new(150.0, 120.0));
        assert_eq!(layout.cat.top(), headroom(120.0));
        assert_eq!(layout.footer.top(), layout.cat.bottom());
        assert_eq!(layout.size(), Vec2::new(150.0, layout.cat.bottom() + FOOTER_HEIGHT));
    }

    #[test]
    fn combo_counter_sits_under_the_total() {
        let combo = Vec2::new(30.0, 20.0);
        let (total, combo_pos) = label_positions(200.0, None, combo);
        assert_eq!(total, None);
        assert_eq!(combo_pos, Pos2::new(160.0, 10.0));

        // Narrow totals are padded to the minimum width.
        let (total, combo_pos) = label_positions(200.0, Some(Vec2::new(20.0, 24.0)), combo);
        assert_eq!(total, Some(Pos2::new(140.0, 10.0)));
        assert_eq!(combo_pos, Pos2::new(160.0, 39.0));
    }

    #[test]
    fn footer_fill_uses_configured_alpha() {
        assert_eq!(footer_fill(128), Color32::from_rgba_unmultiplied(40, 44, 52, 128));
    }
}
