use crate::layout::Rgba;
use ab_glyph::{Font, FontArc, Glyph, GlyphId, PxScale, ScaleFont, point};
use anyhow::{Context, Result};
use readex_cache::{TextKey, get_text};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Pixmap, PremultipliedColorU8};

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Advance width of one line, kerning included
pub fn text_width(font: &FontArc, text: &str, size: f32) -> f32 {
    let sf = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = sf.glyph_id(ch);
        if let Some(p) = prev {
            width += sf.kern(p, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Rasterizes one line into a transparent pixmap sized to its line box:
/// advance width by ascent minus descent, baseline at the ascent.
pub fn render_text_pixmap(text: &str, size: f32, font: &FontArc, rgba: Rgba) -> Option<Pixmap> {
    let scale = PxScale::from(size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = sf.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let w = pen_x.ceil().max(1.0) as u32;
    let h = (sf.ascent() - sf.descent()).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let [cr, cg, cb, ca] = rgba;
    for g in glyphs {
        let Some(outline) = font.outline_glyph(g) else {
            continue;
        };
        let bounds = outline.px_bounds();
        outline.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = x as i32 + bounds.min.x as i32;
            let iy = y as i32 + bounds.min.y as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // source-over in premultiplied space
            let a = (cov * f32::from(ca) / 255.0).clamp(0.0, 1.0);
            let inv = 1.0 - a;
            let bg = dst[i];
            let over = |s: u8, d: u8| (f32::from(s) * a + f32::from(d) * inv).round().min(255.0) as u8;
            let alpha = over(255, bg.alpha());
            if let Some(px) = PremultipliedColorU8::from_rgba(
                over(cr, bg.red()).min(alpha),
                over(cg, bg.green()).min(alpha),
                over(cb, bg.blue()).min(alpha),
                alpha,
            ) {
                dst[i] = px;
            }
        });
    }
    Some(pm)
}

/// Rasterized lines keyed by interned text, size and color
pub struct TextCache {
    font: FontArc,
    map: HashMap<TextKey, Arc<Pixmap>>,
    limit: usize,
}

impl TextCache {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
            limit: 4096,
        }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, rgba: Rgba) -> Option<Arc<Pixmap>> {
        let key = TextKey::new(text, size, rgba);
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        if self.map.len() >= self.limit {
            // bounded: drop everything once full
            self.map.clear();
        }
        let atom = get_text(key.id)?;
        let pm = Arc::new(render_text_pixmap(&atom, key.size_px(), &self.font, rgba)?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}
