use crate::layout::{DrawOp, HitRegion, Metrics, Region, Rgba, layout_screen};
use crate::text::{TextCache, text_width};
use ab_glyph::FontArc;
use anyhow::{Context, Result, bail};
use readex_core::ScreenView;
use readex_timing::{FrameStats, FrameTimer};
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{Color, Paint, Pixmap, PremultipliedColorU8, Rect, Transform};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub layout: Duration,
    pub draw: Duration,
    pub present: Duration,
    pub total: Duration,
    pub ops: usize,
}

/// One presented frame: where things landed and what it cost
#[derive(Debug, Clone)]
pub struct Frame {
    pub hits: Vec<HitRegion>,
    pub stats: RenderStats,
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    metrics: Metrics,
    text: TextCache,
    canvas: Pixmap,
    clock: FrameTimer,
    component_timers: HashMap<&'static str, FrameTimer>,
    frames: u64,
}

const COMPONENTS: [&str; 4] = ["layout", "draw", "present", "total"];

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontArc, metrics: Metrics) -> Result<Self> {
        let canvas = blank_canvas(width, height)?;
        Ok(Self {
            width,
            height,
            metrics,
            text: TextCache::new(font),
            canvas,
            clock: FrameTimer::new(),
            component_timers: COMPONENTS
                .iter()
                .map(|&k| (k, FrameTimer::with_capacity(600)))
                .collect(),
            frames: 0,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = blank_canvas(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Draws `view` and copies the result into `frame_buffer` (RGBA8, the
    /// renderer's size).
    pub fn render(
        &mut self,
        view: &ScreenView,
        loading_step: usize,
        frame_buffer: &mut [u8],
    ) -> Result<Frame> {
        let expected = self.canvas.data().len();
        if frame_buffer.len() != expected {
            bail!(
                "frame buffer is {} bytes, renderer expects {expected} ({}x{})",
                frame_buffer.len(),
                self.width,
                self.height
            );
        }

        let t_start = self.clock.now();
        let layout = {
            let font = self.text.font().clone();
            let measure = |s: &str, size: f32| text_width(&font, s, size);
            layout_screen(
                view,
                self.width as f32,
                self.height as f32,
                self.metrics,
                &measure,
                loading_step,
            )
        };
        let t_layout = self.clock.elapsed(t_start);

        let t = self.clock.now();
        for op in &layout.ops {
            self.draw(op);
        }
        let t_draw = self.clock.elapsed(t);

        let t = self.clock.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let t_present = self.clock.elapsed(t);

        let stats = RenderStats {
            layout: t_layout,
            draw: t_draw,
            present: t_present,
            total: t_layout + t_draw + t_present,
            ops: layout.ops.len(),
        };
        for (name, d) in [
            ("layout", stats.layout),
            ("draw", stats.draw),
            ("present", stats.present),
            ("total", stats.total),
        ] {
            if let Some(timer) = self.component_timers.get_mut(name) {
                timer.record_frame(d);
            }
        }
        self.frames += 1;
        if self.frames % 600 == 0 {
            if let Some(total) = self.component_timers.get("total") {
                let s = total.stats();
                trace!(
                    avg_ms = s.mean.as_secs_f64() * 1e3,
                    max_ms = s.max.as_secs_f64() * 1e3,
                    jitter_ms = s.jitter.as_secs_f64() * 1e3,
                    cached_lines = self.text.len(),
                    "render timings"
                );
            }
        }

        Ok(Frame {
            hits: layout.hits,
            stats,
        })
    }

    pub fn component_stats(&self) -> Vec<(&'static str, FrameStats)> {
        COMPONENTS
            .iter()
            .filter_map(|&k| self.component_timers.get(k).map(|t| (k, t.stats())))
            .collect()
    }

    fn draw(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Fill { region, color } => fill_region(&mut self.canvas, *region, *color),
            DrawOp::Outline {
                region,
                color,
                width,
            } => outline_region(&mut self.canvas, *region, *color, *width),
            DrawOp::Text {
                text,
                x,
                y,
                size,
                color,
            } => {
                if let Some(pm) = self.text.get_or_render(text, *size, *color) {
                    blit(&mut self.canvas, &pm, x.round() as i32, y.round() as i32);
                }
            }
        }
    }
}

fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
    let mut canvas = Pixmap::new(width.max(1), height.max(1))
        .with_context(|| format!("allocating {width}x{height} canvas"))?;
    canvas.fill(Color::from_rgba8(0, 0, 0, 255));
    Ok(canvas)
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    p.anti_alias = false;
    p
}

pub fn fill_region(canvas: &mut Pixmap, region: Region, color: Rgba) {
    if let Some(rect) = Rect::from_xywh(region.x, region.y, region.w, region.h) {
        canvas.fill_rect(rect, &paint(color), Transform::identity(), None);
    }
}

pub fn outline_region(canvas: &mut Pixmap, region: Region, color: Rgba, width: f32) {
    let Region { x, y, w, h } = region;
    let t = width.min(w * 0.5).min(h * 0.5);
    for edge in [
        Region::new(x, y, w, t),
        Region::new(x, y + h - t, w, t),
        Region::new(x, y + t, t, h - 2.0 * t),
        Region::new(x + w - t, y + t, t, h - 2.0 * t),
    ] {
        fill_region(canvas, edge, color);
    }
}

/// Source-over of a premultiplied pixmap at `(x, y)`, clipped to the canvas.
pub fn blit(canvas: &mut Pixmap, src: &Pixmap, x: i32, y: i32) {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let (w, h) = (src.width() as i32, src.height() as i32);
    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return;
    }

    let dst_x = x.max(0);
    let dst_y = y.max(0);
    let src_x = dst_x - x;
    let src_y = dst_y - y;
    let copy_w = (w - src_x).min(cw - dst_x) as usize;
    let copy_h = (h - src_y).min(ch - dst_y) as usize;

    let src_px = src.pixels();
    let src_stride = src.width() as usize;
    let dst_stride = canvas.width() as usize;
    let dst_px = canvas.pixels_mut();

    for row in 0..copy_h {
        let s0 = (src_y as usize + row) * src_stride + src_x as usize;
        let d0 = (dst_y as usize + row) * dst_stride + dst_x as usize;
        let src_row = &src_px[s0..s0 + copy_w];
        let dst_row = &mut dst_px[d0..d0 + copy_w];
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            let sa = u32::from(s.alpha());
            if sa == 0 {
                continue;
            }
            if sa == 255 {
                *d = *s;
                continue;
            }
            let inv = 255 - sa;
            let over = |s: u8, d: u8| (u32::from(s) + (u32::from(d) * inv + 127) / 255).min(255) as u8;
            let a = over(s.alpha(), d.alpha());
            if let Some(px) = PremultipliedColorU8::from_rgba(
                over(s.red(), d.red()).min(a),
                over(s.green(), d.green()).min(a),
                over(s.blue(), d.blue()).min(a),
                a,
            ) {
                *d = px;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: Rgba) -> Pixmap {
        let mut pm = Pixmap::new(w, h).unwrap();
        pm.fill(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        pm
    }

    fn pixel(pm: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pm.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn opaque_blit_is_clipped_to_canvas() {
        let mut canvas = solid(4, 4, [255, 255, 255, 255]);
        let red = solid(3, 3, [255, 0, 0, 255]);
        blit(&mut canvas, &red, 2, -1);
        assert_eq!(pixel(&canvas, 2, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 3, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 1, 0), [255, 255, 255, 255]);
        assert_eq!(pixel(&canvas, 2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn transparent_pixels_leave_canvas_alone() {
        let mut canvas = solid(2, 2, [10, 20, 30, 255]);
        let clear = Pixmap::new(2, 2).unwrap();
        blit(&mut canvas, &clear, 0, 0);
        assert_eq!(pixel(&canvas, 1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn translucent_blit_blends_over_opaque() {
        let mut canvas = solid(1, 1, [255, 255, 255, 255]);
        // premultiplied black at half alpha
        let mut src = Pixmap::new(1, 1).unwrap();
        src.pixels_mut()[0] = PremultipliedColorU8::from_rgba(0, 0, 0, 128).unwrap();
        blit(&mut canvas, &src, 0, 0);
        let [r, _, _, a] = pixel(&canvas, 0, 0);
        assert_eq!(a, 255);
        assert!((126..=128).contains(&r));
    }

    #[test]
    fn offscreen_blit_is_ignored() {
        let mut canvas = solid(2, 2, [0, 0, 0, 255]);
        let red = solid(1, 1, [255, 0, 0, 255]);
        blit(&mut canvas, &red, 5, 5);
        blit(&mut canvas, &red, -1, 0);
        assert_eq!(pixel(&canvas, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn outline_leaves_interior() {
        let mut canvas = solid(10, 10, [255, 255, 255, 255]);
        outline_region(&mut canvas, Region::new(0.0, 0.0, 10.0, 10.0), [0, 0, 0, 255], 2.0);
        assert_eq!(pixel(&canvas, 0, 5), [0, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 9, 9), [0, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 5, 5), [255, 255, 255, 255]);
    }
}
