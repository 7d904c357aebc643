//! Screen layout.
//!
//! Turns a [`ScreenView`] into a flat list of [`DrawOp`]s plus the
//! [`HitRegion`]s clicks are routed through. Text widths come from a
//! [`Measure`] so layout runs without a font in tests and benches.

use readex_core::{
    Body, ButtonView, ModalKind, ModalView, OptionView, PanelView, ScreenView, Side, Target,
};

pub type Rgba = [u8; 4];

pub const BACKGROUND: Rgba = [242, 242, 242, 255];
pub const INK: Rgba = [28, 28, 28, 255];
pub const MUTED: Rgba = [112, 112, 112, 255];
pub const ACCENT: Rgba = [31, 106, 165, 255];
pub const ON_ACCENT: Rgba = [255, 255, 255, 255];
pub const PANEL: Rgba = [255, 255, 255, 255];
pub const SELECTED: Rgba = [214, 232, 248, 255];
pub const BORDER: Rgba = [196, 196, 196, 255];
pub const BANNER: Rgba = [255, 236, 179, 255];
pub const SCRIM: Rgba = [0, 0, 0, 110];

/// Cycled on the loading screen, one step per half second
pub const LOADING_PATTERN: [&str; 8] = [".  ", ".. ", "...", " ..", "  .", "   ", " . ", "   "];

pub fn loading_step(elapsed_secs: f64) -> usize {
    if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
        return 0;
    }
    (elapsed_secs * 2.0) as usize % LOADING_PATTERN.len()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.w && py < self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub region: Region,
    pub target: Target,
}

/// Topmost target under the pointer
pub fn hit_test(hits: &[HitRegion], x: f32, y: f32) -> Option<Target> {
    hits.iter()
        .rev()
        .find(|h| h.region.contains(x, y))
        .map(|h| h.target)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        region: Region,
        color: Rgba,
    },
    Outline {
        region: Region,
        color: Rgba,
        width: f32,
    },
    /// One line of text; `x`/`y` is the top-left of its line box
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Rgba,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub text_size: f32,
    pub title_size: f32,
}

impl Metrics {
    pub fn line_height(size: f32) -> f32 {
        size * 1.35
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            text_size: 22.0,
            title_size: 30.0,
        }
    }
}

pub trait Measure {
    /// Advance width of `text` at `size` pixels
    fn width(&self, text: &str, size: f32) -> f32;
}

impl<F: Fn(&str, f32) -> f32> Measure for F {
    fn width(&self, text: &str, size: f32) -> f32 {
        self(text, size)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub ops: Vec<DrawOp>,
    pub hits: Vec<HitRegion>,
}

/// Greedy word wrap. Explicit newlines start new lines and blank lines are
/// kept; a word wider than `max_width` sits alone on its line.
pub fn wrap_with(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    lines
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

struct Composer<'a> {
    measure: &'a dyn Measure,
    metrics: Metrics,
    width: f32,
    height: f32,
    margin: f32,
    out: Layout,
}

impl Composer<'_> {
    fn fill(&mut self, region: Region, color: Rgba) {
        self.out.ops.push(DrawOp::Fill { region, color });
    }

    fn outline(&mut self, region: Region, color: Rgba, width: f32) {
        self.out.ops.push(DrawOp::Outline {
            region,
            color,
            width,
        });
    }

    fn hit(&mut self, region: Region, target: Target) {
        self.out.hits.push(HitRegion { region, target });
    }

    fn wrap(&self, text: &str, max_w: f32, size: f32) -> Vec<String> {
        wrap_with(text, max_w, |s| self.measure.width(s, size))
    }

    fn text_height(&self, text: &str, max_w: f32, size: f32) -> f32 {
        self.wrap(text, max_w, size).len() as f32 * Metrics::line_height(size)
    }

    /// Emits wrapped lines inside `[x, x + max_w)` and returns the y below them.
    fn text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_w: f32,
        size: f32,
        color: Rgba,
        align: Align,
    ) -> f32 {
        let line_h = Metrics::line_height(size);
        let mut y = y;
        for line in self.wrap(text, max_w, size) {
            if !line.is_empty() {
                let lx = match align {
                    Align::Left => x,
                    Align::Center => x + (max_w - self.measure.width(&line, size)) * 0.5,
                };
                self.out.ops.push(DrawOp::Text {
                    text: line,
                    x: lx,
                    y,
                    size,
                    color,
                });
            }
            y += line_h;
        }
        y
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Comfortable reading column, centered
    fn column(&self) -> (f32, f32) {
        let w = self.content_width().min(self.metrics.text_size * 38.0);
        ((self.width - w) * 0.5, w)
    }

    fn button_size(&self, button: &ButtonView) -> (f32, f32) {
        let size = self.button_text_size(button);
        let w = (self.measure.width(&button.label, size) + size * 2.4).max(size * 7.0);
        (w, Metrics::line_height(size) + size)
    }

    fn button_text_size(&self, button: &ButtonView) -> f32 {
        if button.subtle {
            self.metrics.text_size * 0.75
        } else {
            self.metrics.text_size
        }
    }

    fn button(&mut self, button: &ButtonView, region: Region) {
        let size = self.button_text_size(button);
        if button.subtle {
            self.outline(region, BORDER, 1.0);
        } else {
            self.fill(region, ACCENT);
        }
        let color = if button.subtle { MUTED } else { ON_ACCENT };
        let ty = region.y + (region.h - Metrics::line_height(size)) * 0.5;
        self.text(&button.label, region.x, ty, region.w, size, color, Align::Center);
        self.hit(region, button.target);
    }

    fn banner(&mut self, message: &str) -> f32 {
        let size = self.metrics.text_size * 0.8;
        let h = Metrics::line_height(size) * 1.6;
        self.fill(Region::new(0.0, 0.0, self.width, h), BANNER);
        let ty = (h - Metrics::line_height(size)) * 0.5;
        self.text(message, self.margin, ty, self.content_width(), size, INK, Align::Center);
        h
    }

    fn entry(
        &mut self,
        y: f32,
        label: &str,
        value: &str,
        placeholder: &str,
        options: &[OptionView],
    ) -> f32 {
        let size = self.metrics.text_size;
        let (cx, cw) = self.column();
        let mut y = self.text(label, cx, y, cw, size, INK, Align::Center) + size * 0.5;

        let box_w = cw.min(size * 18.0);
        let field = Region::new((self.width - box_w) * 0.5, y, box_w, Metrics::line_height(size) + size);
        self.fill(field, PANEL);
        self.outline(field, ACCENT, 2.0);
        let (shown, color) = if value.is_empty() {
            (placeholder.to_string(), MUTED)
        } else {
            (format!("{value}|"), INK)
        };
        let ty = field.y + size * 0.5;
        self.text(&shown, field.x + size * 0.5, ty, field.w - size, size, color, Align::Left);
        y = field.y + field.h + size;

        if !options.is_empty() {
            let gap = size;
            let widths: Vec<f32> = options
                .iter()
                .map(|o| self.measure.width(&o.text, size) + size * 2.6)
                .collect();
            let total = widths.iter().sum::<f32>() + gap * (options.len() - 1) as f32;
            let mut x = (self.width - total) * 0.5;
            let row_h = Metrics::line_height(size) + size * 0.6;
            for (option, w) in options.iter().zip(widths) {
                let region = Region::new(x, y, w, row_h);
                self.fill(region, if option.selected { SELECTED } else { PANEL });
                self.outline(region, if option.selected { ACCENT } else { BORDER }, 1.5);
                let mark = Region::new(x + size * 0.4, y + (row_h - size * 0.7) * 0.5, size * 0.7, size * 0.7);
                if option.selected {
                    self.fill(mark, ACCENT);
                } else {
                    self.outline(mark, MUTED, 1.5);
                }
                let ty = y + (row_h - Metrics::line_height(size)) * 0.5;
                self.text(&option.text, x + size * 1.6, ty, w - size * 1.6, size, INK, Align::Left);
                self.hit(region, option.target);
                x += w + gap;
            }
            y += row_h + size;
        }
        y
    }

    fn choices(&mut self, y: f32, prompt: &str, options: &[OptionView]) -> f32 {
        let size = self.metrics.text_size;
        let (cx, cw) = self.column();
        let mut y = self.text(prompt, cx, y, cw, size, INK, Align::Left) + size;
        let pad = size * 0.6;
        for option in options {
            let h = self.text_height(&option.text, cw - 2.0 * pad, size) + 2.0 * pad;
            let region = Region::new(cx, y, cw, h);
            self.fill(region, if option.selected { SELECTED } else { PANEL });
            self.outline(
                region,
                if option.selected { ACCENT } else { BORDER },
                if option.selected { 2.5 } else { 1.0 },
            );
            self.text(&option.text, cx + pad, y + pad, cw - 2.0 * pad, size, INK, Align::Left);
            self.hit(region, option.target);
            y += h + pad;
        }
        y
    }

    fn pair(&mut self, y: f32, left: &PanelView, right: &PanelView, bottom: f32) -> f32 {
        let size = self.metrics.text_size;
        let gap = size * 1.5;
        let pad = size * 0.8;
        let w = (self.content_width() - gap) * 0.5;
        let label_h = Metrics::line_height(size);
        let text_w = w - 2.0 * pad;
        let needed = self
            .text_height(&left.text, text_w, size)
            .max(self.text_height(&right.text, text_w, size))
            + 2.0 * pad;
        let h = needed.max(bottom - y - label_h);

        for (i, (side, panel)) in [(Side::Left, left), (Side::Right, right)].into_iter().enumerate() {
            let x = self.margin + i as f32 * (w + gap);
            self.text(
                &format!("Option {}", side.number()),
                x,
                y,
                w,
                size,
                MUTED,
                Align::Center,
            );
            let region = Region::new(x, y + label_h, w, h);
            self.fill(region, if panel.selected { SELECTED } else { PANEL });
            self.outline(
                region,
                if panel.selected { ACCENT } else { BORDER },
                if panel.selected { 3.0 } else { 1.0 },
            );
            self.text(&panel.text, x + pad, y + label_h + pad, text_w, size, INK, Align::Left);
            self.hit(region, Target::Panel(side));
        }
        y + label_h + h
    }

    /// Pair panels over a multi-line text field anchored above `bottom`.
    fn reflection(
        &mut self,
        y: f32,
        left: &PanelView,
        right: &PanelView,
        prompt: &str,
        value: &str,
        placeholder: &str,
        bottom: f32,
    ) -> f32 {
        const FIELD_LINES: usize = 3;
        let size = self.metrics.text_size;
        let line_h = Metrics::line_height(size);
        let cw = self.content_width();
        let pad = size * 0.5;
        let field_h = line_h * FIELD_LINES as f32 + 2.0 * pad;
        let reserve = self.text_height(prompt, cw, size) + size * 0.5 + field_h + size;

        let below = self.pair(y, left, right, bottom - reserve) + size;
        let top = self.text(prompt, self.margin, below, cw, size, INK, Align::Left) + size * 0.5;
        let field = Region::new(self.margin, top, cw, field_h);
        self.fill(field, PANEL);
        self.outline(field, ACCENT, 2.0);

        let (shown, color) = if value.is_empty() {
            (placeholder.to_string(), MUTED)
        } else {
            (format!("{value}|"), INK)
        };
        // keep the caret in view once the text outgrows the field
        let lines = self.wrap(&shown, cw - 2.0 * pad, size);
        let visible = lines[lines.len().saturating_sub(FIELD_LINES)..].join("\n");
        self.text(&visible, field.x + pad, field.y + pad, cw - 2.0 * pad, size, color, Align::Left);
        field.y + field.h
    }

    fn loading(&mut self, y: f32, headline: &str, detail: &str, step: usize) -> f32 {
        let big = self.metrics.title_size * 1.3;
        let cw = self.content_width();
        let mut y = y + self.height * 0.12;
        y = self.text(headline, self.margin, y, cw, big, INK, Align::Center);
        y = self.text(detail, self.margin, y, cw, self.metrics.text_size, MUTED, Align::Center);
        let dots = LOADING_PATTERN[step % LOADING_PATTERN.len()];
        self.text(
            dots,
            self.margin,
            y + self.metrics.title_size,
            cw,
            self.metrics.title_size * 3.0,
            ACCENT,
            Align::Center,
        )
    }

    fn modal(&mut self, modal: &ModalView) {
        // the modal blocks everything beneath it
        self.out.hits.clear();
        self.fill(Region::new(0.0, 0.0, self.width, self.height), SCRIM);

        let size = self.metrics.text_size;
        let pad = size * 1.2;
        let w = (self.width * 0.6).min(size * 26.0).max(size * 12.0);
        let inner = w - 2.0 * pad;
        let buttons: Vec<ButtonView> = match modal.kind {
            ModalKind::Notice => vec![ButtonView {
                label: "OK".into(),
                target: Target::ModalOk,
                subtle: false,
            }],
            ModalKind::Confirm => vec![
                ButtonView {
                    label: "Yes".into(),
                    target: Target::ModalYes,
                    subtle: false,
                },
                ButtonView {
                    label: "No".into(),
                    target: Target::ModalNo,
                    subtle: false,
                },
            ],
        };
        let title_size = self.metrics.title_size * 0.8;
        let button_h = Metrics::line_height(size) + size;
        let h = pad
            + self.text_height(&modal.title, inner, title_size)
            + size * 0.5
            + self.text_height(&modal.message, inner, size)
            + pad
            + button_h
            + pad;
        let dialog = Region::new((self.width - w) * 0.5, (self.height - h) * 0.5, w, h);
        self.fill(dialog, PANEL);
        self.outline(dialog, BORDER, 1.0);

        let mut y = dialog.y + pad;
        y = self.text(&modal.title, dialog.x + pad, y, inner, title_size, INK, Align::Center);
        y = self.text(&modal.message, dialog.x + pad, y + size * 0.5, inner, size, INK, Align::Center);
        self.button_row(&buttons, dialog.center_x(), y + pad);
    }

    /// Lays buttons side by side, centered on `cx`.
    fn button_row(&mut self, buttons: &[ButtonView], cx: f32, y: f32) {
        let gap = self.metrics.text_size;
        let sizes: Vec<(f32, f32)> = buttons.iter().map(|b| self.button_size(b)).collect();
        let total: f32 =
            sizes.iter().map(|s| s.0).sum::<f32>() + gap * buttons.len().saturating_sub(1) as f32;
        let mut x = cx - total * 0.5;
        for (button, (w, h)) in buttons.iter().zip(sizes) {
            self.button(button, Region::new(x, y, w, h));
            x += w + gap;
        }
    }
}

pub fn layout_screen(
    view: &ScreenView,
    width: f32,
    height: f32,
    metrics: Metrics,
    measure: &dyn Measure,
    loading_step: usize,
) -> Layout {
    let mut c = Composer {
        measure,
        metrics,
        width,
        height,
        margin: (width * 0.06).max(metrics.text_size),
        out: Layout::default(),
    };
    c.fill(Region::new(0.0, 0.0, width, height), BACKGROUND);

    let size = metrics.text_size;
    let footer_size = size * 0.6;
    let footer_h = Metrics::line_height(footer_size);

    let (primary, subtle): (Vec<&ButtonView>, Vec<&ButtonView>) =
        view.buttons.iter().partition(|b| !b.subtle);
    let button_h = Metrics::line_height(size) + size;
    let buttons_y = height - c.margin * 0.5 - footer_h - size * 0.5 - button_h;

    let mut y = c.margin * 0.5;
    if let Some(banner) = &view.banner {
        y += c.banner(banner);
    }
    if !view.title.is_empty() {
        let cw = c.content_width();
        y = c.text(&view.title, c.margin, y + size * 0.5, cw, metrics.title_size, INK, Align::Center);
    }
    if let Some(subtitle) = &view.subtitle {
        let cw = c.content_width();
        y = c.text(subtitle, c.margin, y, cw, size * 0.8, MUTED, Align::Center);
    }
    y += size;

    match &view.body {
        Body::Empty => {}
        Body::Text(text) => {
            let (cx, cw) = c.column();
            c.text(text, cx, y, cw, size, INK, Align::Left);
        }
        Body::Entry {
            label,
            value,
            placeholder,
            options,
        } => {
            c.entry(y, label, value, placeholder, options);
        }
        Body::Choices { prompt, options } => {
            c.choices(y, prompt, options);
        }
        Body::Pair { left, right } => {
            c.pair(y, left, right, buttons_y - size);
        }
        Body::Reflection {
            left,
            right,
            prompt,
            value,
            placeholder,
        } => {
            c.reflection(y, left, right, prompt, value, placeholder, buttons_y - size);
        }
        Body::Loading { headline, detail } => {
            c.loading(y, headline, detail, loading_step);
        }
    }

    let primary: Vec<ButtonView> = primary.into_iter().cloned().collect();
    c.button_row(&primary, width * 0.5, buttons_y);
    let mut right = width - c.margin;
    for button in subtle {
        let (w, h) = c.button_size(button);
        right -= w;
        c.button(button, Region::new(right, buttons_y + (button_h - h), w, h));
        right -= size;
    }

    if let Some(footer) = &view.footer {
        let fy = height - c.margin * 0.5 - footer_h;
        let cw = c.content_width();
        c.text(footer, c.margin, fy, cw, footer_size, MUTED, Align::Left);
    }

    if let Some(modal) = &view.modal {
        c.modal(modal);
    }
    c.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use readex_core::ButtonId;

    /// Every character is half the font size wide
    fn mono(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }

    fn layout(view: &ScreenView) -> Layout {
        layout_screen(view, 1280.0, 720.0, Metrics::default(), &mono, 0)
    }

    #[test]
    fn wrap_breaks_on_words_and_keeps_newlines() {
        let lines = wrap_with("aa bb cc\n\ndd", 5.0, |s| s.len() as f32);
        assert_eq!(lines, vec!["aa bb", "cc", "", "dd"]);
    }

    #[test]
    fn long_word_stays_whole() {
        let lines = wrap_with("a supercalifragilistic b", 6.0, |s| s.len() as f32);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn hits_cover_every_target() {
        let view = ScreenView::new(
            "Question for Paragraph 1",
            Body::Choices {
                prompt: "Main idea?".into(),
                options: (0..4)
                    .map(|i| OptionView {
                        key: i.to_string(),
                        text: format!("option {i}"),
                        selected: i == 2,
                        target: Target::Option(i),
                    })
                    .collect(),
            },
        )
        .with_button(ButtonView::new("Continue", ButtonId::Continue));
        let out = layout(&view);
        let mut got: Vec<Target> = out.hits.iter().map(|h| h.target).collect();
        let mut want = view.targets();
        got.sort_by_key(|t| format!("{t:?}"));
        want.sort_by_key(|t| format!("{t:?}"));
        assert_eq!(got, want);
    }

    #[test]
    fn modal_replaces_hits() {
        let view = ScreenView::new("Welcome!", Body::Empty)
            .with_button(ButtonView::new("Start", ButtonId::Start))
            .with_modal(Some(ModalView {
                title: "Confirm ID".into(),
                message: "Is this Participant ID correct?\n\nP007".into(),
                kind: ModalKind::Confirm,
            }));
        let out = layout(&view);
        let targets: Vec<Target> = out.hits.iter().map(|h| h.target).collect();
        assert_eq!(targets, vec![Target::ModalYes, Target::ModalNo]);
    }

    #[test]
    fn pair_panels_sit_left_and_right() {
        let view = ScreenView::new(
            "Water Cycle",
            Body::Pair {
                left: PanelView {
                    text: "one".into(),
                    selected: false,
                },
                right: PanelView {
                    text: "two".into(),
                    selected: false,
                },
            },
        );
        let out = layout(&view);
        let left = out
            .hits
            .iter()
            .find(|h| h.target == Target::Panel(Side::Left))
            .unwrap();
        let right = out
            .hits
            .iter()
            .find(|h| h.target == Target::Panel(Side::Right))
            .unwrap();
        assert!(left.region.x + left.region.w <= right.region.x);
        let (x, y) = (left.region.center_x(), left.region.y + 5.0);
        assert_eq!(hit_test(&out.hits, x, y), Some(Target::Panel(Side::Left)));
        assert_eq!(hit_test(&out.hits, 1.0, 1.0), None);
    }

    #[test]
    fn reflection_field_sits_below_panels() {
        let panel = |text: &str| PanelView {
            text: text.into(),
            selected: false,
        };
        let view = ScreenView::new(
            "Which paragraph describes you?",
            Body::Reflection {
                left: panel("likes stories"),
                right: panel("likes lists"),
                prompt: "Explain your choice.".into(),
                value: "word ".repeat(400),
                placeholder: "Type here".into(),
            },
        )
        .with_button(ButtonView::new("Continue", ButtonId::Continue));
        let out = layout(&view);
        let panel_bottom = out
            .hits
            .iter()
            .find(|h| h.target == Target::Panel(Side::Left))
            .map(|h| h.region.y + h.region.h)
            .unwrap();
        let continue_top = out
            .hits
            .iter()
            .find(|h| h.target == Target::Button(ButtonId::Continue))
            .map(|h| h.region.y)
            .unwrap();
        let prompt_y = out
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, y, .. } if text == "Explain your choice." => Some(*y),
                _ => None,
            })
            .unwrap();
        assert!(panel_bottom < prompt_y);
        assert!(prompt_y < continue_top);
        let typed = out
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with("word")))
            .count();
        assert_eq!(typed, 3);
    }

    #[test]
    fn subtle_buttons_go_right_of_primary() {
        let view = ScreenView::new("Topic", Body::Empty)
            .with_button(ButtonView::new("Continue", ButtonId::Continue))
            .with_button(ButtonView::new("Refresh", ButtonId::Refresh).subtle());
        let out = layout(&view);
        let find = |id| {
            out.hits
                .iter()
                .find(|h| h.target == Target::Button(id))
                .unwrap()
                .region
        };
        assert!(find(ButtonId::Refresh).x > find(ButtonId::Continue).x);
    }

    #[test]
    fn loading_steps_cycle() {
        assert_eq!(loading_step(0.0), 0);
        assert_eq!(loading_step(0.6), 1);
        assert_eq!(loading_step(4.0), 0);
        assert_eq!(loading_step(-1.0), 0);
    }
}
