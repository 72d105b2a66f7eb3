//! Raster surface: composites the agent onto an RGBA canvas

use crate::bubble::BubbleId;
use crate::loader::SpriteSheet;
use crate::motion::Transition;
use crate::surface::Surface;
use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use mascot_core::{LogicalPosition, RenderOffset, SourceRegion};
use std::collections::BTreeMap;

/// Bubble box size, in pixels
const BUBBLE_SIZE: (u32, u32) = (200, 48);

/// Bubble placement relative to the agent's top-left corner
const BUBBLE_ANCHOR: (i32, i32) = (-100, -60);

#[derive(Debug, Clone)]
struct RasterBubble {
    text: String,
    opacity: f32,
}

/// Surface that draws the agent into an image of the viewport.
///
/// The surface tracks the transition it was handed, so [`RasterSurface::compose`]
/// can draw the agent where it is at any logical time. Bubble text is kept
/// but not rasterized; bubbles are drawn as boxes.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    sheet: RgbaImage,
    viewport: (u32, u32),
    background: Rgba<u8>,
    attached: bool,
    sprite: Option<(SourceRegion, RenderOffset)>,
    position: LogicalPosition,
    transition: Option<Transition>,
    bubbles: BTreeMap<BubbleId, RasterBubble>,
}

impl RasterSurface {
    /// Creates a surface for `sheet` with a `viewport`-sized canvas
    pub fn new(sheet: &SpriteSheet, viewport: (u32, u32)) -> Self {
        Self {
            sheet: sheet.image().clone(),
            viewport,
            background: Rgba([0, 0, 0, 0]),
            attached: false,
            sprite: None,
            position: LogicalPosition::default(),
            transition: None,
            bubbles: BTreeMap::new(),
        }
    }

    /// Sets the canvas background color
    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Text of every bubble currently on the surface
    pub fn bubble_texts(&self) -> Vec<&str> {
        self.bubbles.values().map(|b| b.text.as_str()).collect()
    }

    /// Position drawn at `now_ms`
    pub fn position_at(&self, now_ms: u64) -> LogicalPosition {
        match &self.transition {
            Some(transition) => transition.sample(now_ms),
            None => self.position,
        }
    }

    /// Renders the viewport as seen at `now_ms`
    pub fn compose(&self, now_ms: u64) -> RgbaImage {
        let (width, height) = self.viewport;
        let mut canvas = ImageBuffer::from_pixel(width, height, self.background);

        if !self.attached {
            return canvas;
        }
        let Some((region, offset)) = self.sprite else {
            return canvas;
        };

        // Agent box top-left, converted from right/bottom offsets
        let position = self.position_at(now_ms);
        let x = to_pixel(width as f64 - position.right - region.width as f64);
        let y = to_pixel(height as f64 - position.bottom - region.height as f64);

        let sprite =
            imageops::crop_imm(&self.sheet, region.x, region.y, region.width, region.height)
                .to_image();
        overlay_image(
            &mut canvas,
            &sprite,
            x + i64::from(offset.dx),
            y + i64::from(offset.dy),
            1.0,
        );

        let bubble_box = bubble_image();
        for bubble in self.bubbles.values() {
            overlay_image(
                &mut canvas,
                &bubble_box,
                x + i64::from(BUBBLE_ANCHOR.0),
                y + i64::from(BUBBLE_ANCHOR.1),
                bubble.opacity,
            );
        }

        canvas
    }
}

impl Surface for RasterSurface {
    fn attach_root(&mut self) {
        self.attached = true;
    }

    fn detach_root(&mut self) {
        self.attached = false;
        self.bubbles.clear();
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn render_sprite(&mut self, region: SourceRegion, offset: RenderOffset) {
        self.sprite = Some((region, offset));
    }

    fn begin_transition(&mut self, transition: &Transition) {
        self.transition = Some(*transition);
    }

    fn set_position(&mut self, position: LogicalPosition) {
        self.transition = None;
        self.position = position;
    }

    fn create_bubble(&mut self, id: BubbleId, text: &str) {
        self.bubbles.insert(
            id,
            RasterBubble {
                text: text.to_string(),
                opacity: 0.0,
            },
        );
    }

    // Opacity jumps to the target; the canvas is sampled, not animated
    fn fade_bubble(&mut self, id: BubbleId, opacity: f32, _fade_ms: u64) {
        if let Some(bubble) = self.bubbles.get_mut(&id) {
            bubble.opacity = opacity;
        }
    }

    fn remove_bubble(&mut self, id: BubbleId) {
        self.bubbles.remove(&id);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }
}

/// White box with a one pixel black border
fn bubble_image() -> RgbaImage {
    let (w, h) = BUBBLE_SIZE;
    ImageBuffer::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

/// Canvas coordinate for a logical one; far-off values saturate at the `i32` range
fn to_pixel(value: f64) -> i64 {
    value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i64
}

/// Overlays one image onto another at the specified position
fn overlay_image(base: &mut RgbaImage, overlay: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let base_width = i64::from(base.width());
    let base_height = i64::from(base.height());

    // Calculate the region to copy
    let src_x_start = 0.max(-x);
    let src_y_start = 0.max(-y);
    let src_x_end = i64::from(overlay.width()).min(base_width - x);
    let src_y_end = i64::from(overlay.height()).min(base_height - y);

    if src_x_start >= src_x_end || src_y_start >= src_y_end {
        return;
    }

    for src_y in src_y_start..src_y_end {
        for src_x in src_x_start..src_x_end {
            let dest_x = (x + src_x) as u32;
            let dest_y = (y + src_y) as u32;

            let top = overlay.get_pixel(src_x as u32, src_y as u32);
            let bottom = base.get_pixel(dest_x, dest_y);

            // Source-over alpha compositing
            let alpha = top[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
            let inv_alpha = 1.0 - alpha;
            let base_alpha = bottom[3] as f32 / 255.0;
            let out_alpha = alpha + base_alpha * inv_alpha;
            if out_alpha <= 0.0 {
                continue;
            }

            let channel = |i: usize| {
                let value = (top[i] as f32 * alpha + bottom[i] as f32 * base_alpha * inv_alpha)
                    / out_alpha;
                value.round().clamp(0.0, 255.0) as u8
            };

            let blended = Rgba([
                channel(0),
                channel(1),
                channel(2),
                (out_alpha * 255.0).round() as u8,
            ]);
            base.put_pixel(dest_x, dest_y, blended);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agent, AgentConfig};
    use mascot_core::sprites;

    /// Left frame red, right frame blue, matching the Clippy table layout
    fn sheet() -> SpriteSheet {
        let image = ImageBuffer::from_fn(248, 93, |x, _| {
            if x < 124 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        SpriteSheet::from_image("memory.png", image)
    }

    fn agent() -> Agent<RasterSurface> {
        let config = AgentConfig {
            initial_position: LogicalPosition::new(0.0, 0.0),
            ..AgentConfig::default()
        };
        Agent::new(
            sprites::clippy_animations().unwrap(),
            config,
            RasterSurface::new(&sheet(), (400, 300)),
        )
    }

    #[test]
    fn test_hidden_agent_draws_nothing() {
        let agent = agent();
        let canvas = agent.surface().compose(agent.now());
        assert!(canvas.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_idle_frame_in_bottom_right_corner() {
        let mut agent = agent();
        agent.show();

        let canvas = agent.surface().compose(agent.now());
        assert_eq!(canvas.get_pixel(399, 299), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(276, 207), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(275, 207)[3], 0);
    }

    #[test]
    fn test_wave_frame_uses_offset_and_region() {
        let mut agent = agent();
        agent.show();
        agent.advance_by(400);
        agent.play("Wave");

        // Second sheet cell, lifted by ten pixels
        let canvas = agent.surface().compose(agent.now());
        assert_eq!(canvas.get_pixel(300, 197), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(300, 296)[3], 0);
    }

    #[test]
    fn test_position_follows_transition() {
        let mut agent = agent();
        agent.show();
        agent.move_to_with_duration(100.0, 0.0, 1000);

        agent.advance_by(500);
        let midway = agent.surface().position_at(agent.now());
        assert!((midway.right - 50.0).abs() < 1.0);

        agent.advance_by(500);
        let canvas = agent.surface().compose(agent.now());
        assert_eq!(canvas.get_pixel(299, 299), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(300, 299)[3], 0);
    }

    #[test]
    fn test_bubble_drawn_while_visible() {
        let mut agent = agent();
        agent.show();
        agent.speak("Hello!");

        let canvas = agent.surface().compose(agent.now());
        // Border pixel of the bubble box above and left of the agent
        assert_eq!(canvas.get_pixel(176, 147), &Rgba([0, 0, 0, 255]));
        assert_eq!(agent.surface().bubble_texts(), vec!["Hello!"]);

        agent.advance_by(3300);
        let canvas = agent.surface().compose(agent.now());
        assert_eq!(canvas.get_pixel(176, 147)[3], 0);
    }

    #[test]
    fn test_far_off_screen_position_draws_nothing() {
        let mut agent = agent();
        agent.show();
        agent.move_to_with_duration(1e12, 0.0, 0);
        agent.speak("x");

        let canvas = agent.surface().compose(agent.now());
        assert!(canvas.pixels().all(|p| p[3] == 0));

        agent.move_to_with_duration(-1e12, -1e12, 0);
        let canvas = agent.surface().compose(agent.now());
        assert!(canvas.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_overlay_clips_at_edges() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));

        overlay_image(&mut base, &overlay, -1, 2, 1.0);
        assert_eq!(base.get_pixel(0, 2), &Rgba([255, 255, 255, 255]));
        assert_eq!(base.get_pixel(1, 3), &Rgba([255, 255, 255, 255]));
        assert_eq!(base.get_pixel(2, 2), &Rgba([0, 0, 0, 255]));
    }
}
