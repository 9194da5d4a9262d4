use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::QuadApp;
use crate::device::{GpuFault, GpuInit};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "quadrant".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one fixed-size window and renders into it until it is closed.
    ///
    /// A fatal startup or frame error ends the loop and is returned.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    app: QuadApp<'this>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    entry: Option<WindowEntry>,

    /// Slot the next frame renders into.
    slot: usize,
    reported_stalls: u64,

    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            entry: None,
            slot: 0,
            reported_stalls: 0,
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = &self.gpu_init;
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            app_builder: |w| QuadApp::init(w, gpu_init),
        }
        .try_build()?;

        self.slot = entry.borrow_app().first_slot();
        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal.get_or_insert(err);
        self.entry = None;
        event_loop.exit();
    }

    /// Drains the GPU and releases the window.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        let Some(mut entry) = self.entry.take() else {
            event_loop.exit();
            return;
        };

        match entry.with_app_mut(|app| app.destroy()) {
            Ok(()) => event_loop.exit(),
            Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("shutdown drain failed")),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let slot = self.slot;
        let reported_stalls = &mut self.reported_stalls;

        let result = entry.with_mut(|fields| {
            let ft = fields.clock.tick();
            fields.app.update(&ft);
            let next = fields.app.render(slot)?;

            if let Some(report) = fields.clock.take_report() {
                let stats = fields.app.pacing_stats();
                log::info!(
                    "{:.1} fps, {} blocking waits, {} frame(s) in flight",
                    report.fps(),
                    stats.stalls - *reported_stalls,
                    fields.app.in_flight()
                );
                *reported_stalls = stats.stalls;
            }

            Ok::<usize, GpuFault>(next)
        });

        match result {
            Ok(next) => self.slot = next,
            Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("frame failed")),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.fatal.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("startup failed"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation paces the loop.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),

            WindowEvent::Resized(size) => {
                // Fixed-size window; the surface keeps its startup extent.
                log::debug!("ignoring resize to {}x{}", size.width, size.height);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
