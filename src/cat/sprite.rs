use std::collections::HashMap;
use std::path::Path;

use image::{Rgba, RgbaImage};

use super::Pose;
use crate::error::{Error, Result};

/// Side of the square shown when a pose image cannot be loaded.
pub const PLACEHOLDER_SIZE: u32 = 100;

/// Decoded, rotated pose images.
pub struct SpriteSet {
    images: HashMap<Pose, RgbaImage>,
}

impl SpriteSet {
    /// Load one image per pose and straighten each by `rotation_degrees`
    /// (positive is clockwise). Unloadable images become a red placeholder.
    pub fn load(path_for: impl Fn(Pose) -> std::path::PathBuf, rotation_degrees: f32) -> Self {
        let images = Pose::ALL
            .into_iter()
            .map(|pose| {
                let path = path_for(pose);
                let img = match load_rotated(&path, rotation_degrees) {
                    Ok(img) => img,
                    Err(e) => {
                        log::error!("Error loading image: {e}");
                        placeholder()
                    }
                };
                (pose, img)
            })
            .collect();
        Self { images }
    }

    pub fn get(&self, pose: Pose) -> &RgbaImage {
        // Every pose is filled in by `load`.
        &self.images[&pose]
    }

    /// Window content size, taken from the idle image.
    pub fn size(&self) -> (u32, u32) {
        self.get(Pose::Idle).dimensions()
    }
}

pub fn load_rotated(path: &Path, rotation_degrees: f32) -> Result<RgbaImage> {
    let img = image::open(path)
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Ok(rotate(&img, rotation_degrees))
}

pub fn placeholder() -> RgbaImage {
    RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgba([255, 0, 0, 255]))
}

/// Rotate about the centre into a canvas grown to fit the rotated bounds,
/// with bilinear filtering. Pixels outside the source are transparent.
pub fn rotate(src: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return src.clone();
    }
    let (w, h) = (src.width() as f32, src.height() as f32);
    let (sin, cos) = degrees.to_radians().sin_cos();

    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ocx, ocy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = x as f32 + 0.5 - ocx;
        let dy = y as f32 + 0.5 - ocy;
        // Inverse rotation back into source space.
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        sample_bilinear(src, sx - 0.5, sy - 0.5)
    })
}

fn sample_bilinear(src: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    // Accumulate premultiplied so transparent neighbours do not darken edges.
    let mut acc = [0.0f32; 4];
    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1.0, y0, fx * (1.0 - fy)),
        (x0, y0 + 1.0, (1.0 - fx) * fy),
        (x0 + 1.0, y0 + 1.0, fx * fy),
    ];
    for (tx, ty, weight) in taps {
        if tx < 0.0 || ty < 0.0 || tx >= src.width() as f32 || ty >= src.height() as f32 {
            continue;
        }
        let p = src.get_pixel(tx as u32, ty as u32).0;
        let a = p[3] as f32 / 255.0 * weight;
        acc[0] += p[0] as f32 * a;
        acc[1] += p[1] as f32 * a;
        acc[2] += p[2] as f32 * a;
        acc[3] += a;
    }

    if acc[3] <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([
        (acc[0] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[1] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[2] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[3] * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rotation_is_identity() {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]));
        assert_eq!(rotate(&img, 0.0), img);
        assert_eq!(rotate(&img, 360.0), img);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([0, 255, 0, 255]));
        let out = rotate(&img, 90.0);
        assert_eq!(out.dimensions(), (20, 40));
        assert_eq!(out.get_pixel(10, 20).0, [0, 255, 0, 255]);
    }

    #[test]
    fn tilt_grows_canvas_with_transparent_corners() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([200, 100, 50, 255]));
        let out = rotate(&img, -13.0);
        assert!(out.width() > 100 && out.height() > 100);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        let (cx, cy) = (out.width() / 2, out.height() / 2);
        assert_eq!(out.get_pixel(cx, cy).0, [200, 100, 50, 255]);
    }

    #[test]
    fn missing_image_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let sprites = SpriteSet::load(|pose| dir.path().join(pose.default_file()), -13.0);
        for pose in Pose::ALL {
            let img = sprites.get(pose);
            assert_eq!(img.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
            assert_eq!(img.get_pixel(50, 50).0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn real_png_is_loaded_and_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat-rest.png");
        RgbaImage::from_pixel(30, 30, Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let img = load_rotated(&path, -13.0).unwrap();
        assert!(img.width() > 30);
    }
}
