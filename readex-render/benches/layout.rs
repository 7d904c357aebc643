use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use readex_core::{Body, ButtonId, ButtonView, OptionView, PanelView, ScreenView, Target};
use readex_render::{Metrics, layout_screen, wrap_with};
use tiny_skia::Pixmap;

const PARAGRAPH: &str = "Water moves continuously through the environment. It evaporates \
from oceans and lakes, condenses into clouds, and falls back to the surface as rain or snow. \
Some of it soaks into the ground and feeds rivers that carry it back to the sea, where the \
cycle begins again. ";

fn approx(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

fn reading_view() -> ScreenView {
    ScreenView::new("Paragraph 3 of 40", Body::Text(PARAGRAPH.repeat(4)))
        .with_subtitle("Read silently. Press SPACE or click 'Done' when you are finished.")
        .with_button(ButtonView::new("Done", ButtonId::Done))
        .with_footer(Some("ID: P007".into()))
}

fn question_view() -> ScreenView {
    ScreenView::new(
        "Question for Paragraph 3",
        Body::Choices {
            prompt: "What is the main idea of the paragraph?".into(),
            options: (0..4)
                .map(|i| OptionView {
                    key: i.to_string(),
                    text: format!("{}. {}", i, &PARAGRAPH[..80]),
                    selected: i == 1,
                    target: Target::Option(i),
                })
                .collect(),
        },
    )
    .with_button(ButtonView::new("Continue", ButtonId::Continue))
}

fn pair_view() -> ScreenView {
    ScreenView::new(
        "Topic 5: Plate Tectonics",
        Body::Pair {
            left: PanelView {
                text: PARAGRAPH.repeat(2),
                selected: true,
            },
            right: PanelView {
                text: PARAGRAPH.repeat(2),
                selected: false,
            },
        },
    )
    .with_button(ButtonView::new("Continue", ButtonId::Continue))
    .with_button(ButtonView::new("Refresh", ButtonId::Refresh).subtle())
}

pub fn bench_wrap(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(8);
    c.bench_function("wrap_paragraph", |b| {
        b.iter(|| wrap_with(black_box(&text), 900.0, |s| approx(s, 22.0)))
    });
}

pub fn bench_layout(c: &mut Criterion) {
    let mut g = c.benchmark_group("layout_screen");
    for (name, view) in [
        ("reading", reading_view()),
        ("question", question_view()),
        ("pair", pair_view()),
    ] {
        g.bench_function(name, |b| {
            b.iter(|| {
                layout_screen(
                    black_box(&view),
                    1920.0,
                    1080.0,
                    Metrics::default(),
                    &approx,
                    0,
                )
            })
        });
    }
    g.finish();
}

pub fn bench_present(c: &mut Criterion) {
    let canvas = Pixmap::new(1920, 1080).unwrap();
    c.bench_function("present_copy_1080p", |b| {
        b.iter_batched(
            || vec![0u8; canvas.data().len()],
            |mut frame| {
                frame.copy_from_slice(canvas.data());
                frame
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_wrap, bench_layout, bench_present);
criterion_main!(benches);
