// ABOUTME: Renders the menubar play glyph with the image crate instead of shipping bitmap assets
// ABOUTME: Outline triangle while idle, filled while a preview is running; black-on-alpha for template mode

use image::{Rgba, RgbaImage};

pub const ICON_SIZE: u32 = 32;

const OUTLINE_WIDTH: f32 = 2.5;
// Play triangle, clockwise
const VERTICES: [(f32, f32); 3] = [(9.0, 5.0), (26.0, 16.0), (9.0, 27.0)];

pub fn render_status_icon(active: bool) -> RgbaImage {
    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let inset = edge_inset(x as f32 + 0.5, y as f32 + 0.5);
        let opaque = if active {
            inset >= 0.0
        } else {
            (0.0..OUTLINE_WIDTH).contains(&inset)
        };

        if opaque {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Distance from the point to the nearest triangle edge; negative outside.
fn edge_inset(px: f32, py: f32) -> f32 {
    (0..VERTICES.len())
        .map(|i| {
            let (ax, ay) = VERTICES[i];
            let (bx, by) = VERTICES[(i + 1) % VERTICES.len()];
            let (dx, dy) = (bx - ax, by - ay);
            let length = (dx * dx + dy * dy).sqrt();
            // Positive on the inner side of a clockwise edge (y grows downwards)
            (dx * (py - ay) - dy * (px - ax)) / length
        })
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(image: &RgbaImage, x: u32, y: u32) -> u8 {
        image.get_pixel(x, y).0[3]
    }

    #[test]
    fn test_icon_dimensions() {
        let icon = render_status_icon(false);
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
    }

    #[test]
    fn test_active_icon_is_filled() {
        let icon = render_status_icon(true);
        assert_eq!(alpha(&icon, 14, 16), 255);
    }

    #[test]
    fn test_idle_icon_is_outlined() {
        let icon = render_status_icon(false);
        // Center is hollow, left edge is drawn
        assert_eq!(alpha(&icon, 14, 16), 0);
        assert_eq!(alpha(&icon, 9, 16), 255);
    }

    #[test]
    fn test_corners_are_transparent() {
        for active in [false, true] {
            let icon = render_status_icon(active);
            assert_eq!(alpha(&icon, 0, 0), 0);
            assert_eq!(alpha(&icon, 31, 31), 0);
            assert_eq!(alpha(&icon, 31, 0), 0);
        }
    }

    #[test]
    fn test_active_icon_covers_more_pixels() {
        let count = |image: &RgbaImage| image.pixels().filter(|p| p.0[3] > 0).count();
        assert!(count(&render_status_icon(true)) > count(&render_status_icon(false)));
    }
}
