use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use readex_core::{Body, Input};
use readex_experiment::config::DisplayConfig;
use readex_experiment::{Driver, Sequencer, Status};
use readex_provider::{Deliver, GenerationOutcome};
use readex_render::{FontArc, HitRegion, Metrics, SkiaRenderer, hit_test, loading_step};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

/// Loading-screen animation tick
const TICK: Duration = Duration::from_millis(125);

#[derive(Debug)]
pub enum UserEvent {
    Generated(GenerationOutcome),
}

/// Hands worker results to the event loop.
pub struct ProxySink(EventLoopProxy<UserEvent>);

impl ProxySink {
    pub fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self(proxy)
    }
}

impl Deliver for ProxySink {
    fn deliver(&self, outcome: GenerationOutcome) -> bool {
        self.0.send_event(UserEvent::Generated(outcome)).is_ok()
    }
}

pub struct App<S: Sequencer> {
    driver: Driver<S>,
    display: DisplayConfig,
    font: FontArc,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    hits: Vec<HitRegion>,
    cursor: Option<PhysicalPosition<f64>>,
    loading_since: Option<Instant>,
    next_tick: Option<Instant>,
    failure: Option<anyhow::Error>,
}

impl<S: Sequencer> App<S> {
    pub fn new(sequencer: S, display: DisplayConfig, font: FontArc) -> Self {
        Self {
            driver: Driver::new(sequencer),
            display,
            font,
            window: None,
            pixels: None,
            renderer: None,
            hits: Vec::new(),
            cursor: None,
            loading_since: None,
            next_tick: None,
            failure: None,
        }
    }

    pub fn run(mut self, event_loop: EventLoop<UserEvent>) -> Result<()> {
        event_loop.run_app(&mut self)?;
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let mut attributes = Window::default_attributes().with_title(self.display.title.clone());
        attributes = if self.display.fullscreen {
            attributes
                .with_fullscreen(Some(Fullscreen::Borderless(monitor.clone())))
                .with_resizable(false)
        } else {
            attributes.with_inner_size(PhysicalSize::new(self.display.width, self.display.height))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        let scale = window.scale_factor();
        info!(
            width = size.width,
            height = size.height,
            scale,
            refresh_hz = ?monitor
                .and_then(|m| m.refresh_rate_millihertz())
                .map(|mhz| f64::from(mhz) / 1000.0),
            "display ready"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels = Pixels::new(size.width, size.height, surface).context("creating surface")?;
        let renderer = SkiaRenderer::new(
            size.width,
            size.height,
            self.font.clone(),
            self.metrics(scale),
        )?;

        self.pixels = Some(pixels);
        self.renderer = Some(renderer);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn metrics(&self, scale: f64) -> Metrics {
        let scale = scale as f32;
        Metrics {
            text_size: self.display.text_size * scale,
            title_size: self.display.title_size * scale,
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let view = self.driver.view();
        let step = if matches!(view.body, Body::Loading { .. }) {
            let since = *self.loading_since.get_or_insert_with(Instant::now);
            loading_step(since.elapsed().as_secs_f64())
        } else {
            self.loading_since = None;
            0
        };

        let frame = renderer.render(&view, step, pixels.frame_mut())?;
        pixels.render().context("presenting frame")?;
        self.hits = frame.hits;
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels
                .resize_surface(size.width, size.height)
                .context("resizing surface")?;
            pixels
                .resize_buffer(size.width, size.height)
                .context("resizing buffer")?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height)?;
        }
        debug!(width = size.width, height = size.height, "resized");
        self.request_redraw();
        Ok(())
    }

    fn rescale(&mut self, scale: f64) -> Result<()> {
        let metrics = self.metrics(scale);
        if let (Some(renderer), Some(window)) = (self.renderer.as_mut(), self.window.as_ref()) {
            let (width, height) = renderer.size();
            *renderer = SkiaRenderer::new(width, height, self.font.clone(), metrics)?;
            let size = window.inner_size();
            return self.resize(size);
        }
        Ok(())
    }

    fn feed(&mut self, event_loop: &ActiveEventLoop, input: Input) {
        let status = self.driver.input(input);
        self.settle(event_loop, status);
    }

    fn settle(&mut self, event_loop: &ActiveEventLoop, status: Status) {
        match status {
            Status::Running => self.request_redraw(),
            Status::Exit => {
                info!("session closed");
                event_loop.exit();
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!(error = %format!("{e:#}"), "fatal window error");
        if let Err(save) = self.driver.flush() {
            error!(error = %save, "final save failed");
        }
        self.failure = Some(e);
        event_loop.exit();
    }

    fn animating(&self) -> bool {
        self.loading_since.is_some()
    }
}

impl<S: Sequencer> ApplicationHandler<UserEvent> for App<S> {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause {
            self.next_tick = None;
            self.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Generated(outcome) => {
                let status = self.driver.generated(outcome);
                self.settle(event_loop, status);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("window closed by the system");
                // errors are already logged by the driver
                let _ = self.driver.flush();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                for input in key_inputs(event.state, event.repeat, &event.logical_key) {
                    self.feed(event_loop, input);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let target = self
                    .cursor
                    .and_then(|p| hit_test(&self.hits, p.x as f32, p.y as f32));
                if let Some(target) = target {
                    self.feed(event_loop, Input::Click(target));
                }
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Err(e) = self.rescale(scale_factor) {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.animating() {
            let due = *self.next_tick.get_or_insert_with(|| Instant::now() + TICK);
            event_loop.set_control_flow(ControlFlow::WaitUntil(due));
        } else {
            self.next_tick = None;
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Fresh presses only; a held key must not walk through timed screens.
fn key_inputs(state: ElementState, repeat: bool, key: &Key) -> Vec<Input> {
    if !state.is_pressed() || repeat {
        return Vec::new();
    }
    translate_key(key)
}

/// Keys the sequencers understand; everything else is dropped.
fn translate_key(key: &Key) -> Vec<Input> {
    match key {
        Key::Named(NamedKey::Enter) => vec![Input::Enter],
        Key::Named(NamedKey::Backspace) => vec![Input::Backspace],
        Key::Named(NamedKey::Space) => vec![Input::Space],
        Key::Named(NamedKey::Tab) => vec![Input::Tab],
        Key::Named(NamedKey::Escape) => vec![Input::Escape],
        Key::Character(text) => text
            .chars()
            .filter(|c| !c.is_control())
            .map(Input::Char)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map_to_inputs() {
        assert_eq!(translate_key(&Key::Named(NamedKey::Enter)), vec![Input::Enter]);
        assert_eq!(translate_key(&Key::Named(NamedKey::Space)), vec![Input::Space]);
        assert_eq!(translate_key(&Key::Named(NamedKey::Tab)), vec![Input::Tab]);
        assert!(translate_key(&Key::Named(NamedKey::F5)).is_empty());
    }

    #[test]
    fn held_keys_do_not_repeat() {
        let space = Key::Named(NamedKey::Space);
        assert_eq!(
            key_inputs(ElementState::Pressed, false, &space),
            vec![Input::Space]
        );
        assert!(key_inputs(ElementState::Pressed, true, &space).is_empty());
        assert!(key_inputs(ElementState::Released, false, &space).is_empty());
    }

    #[test]
    fn characters_are_typed() {
        assert_eq!(translate_key(&Key::Character("y".into())), vec![Input::Char('y')]);
        assert_eq!(
            translate_key(&Key::Character("é1".into())),
            vec![Input::Char('é'), Input::Char('1')]
        );
    }
}
