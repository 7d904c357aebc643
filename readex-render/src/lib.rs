pub mod layout;
pub mod render;
pub mod text;

pub use ab_glyph::FontArc;
pub use layout::{
    DrawOp, HitRegion, Layout, Measure, Metrics, Region, hit_test, layout_screen, loading_step,
    wrap_with,
};
pub use render::{Frame, RenderStats, SkiaRenderer};
pub use text::{TextCache, load_font, render_text_pixmap, text_width};
