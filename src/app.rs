use std::sync::Arc;

use hecs::Entity;
use serde::{Deserialize, Serialize};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{CursorIcon, Window, WindowAttributes, WindowId};

use crate::error::{RunError, SequencerError};
use crate::experience::Experience;
use crate::gpu::GpuContext;
use crate::input::{Input, to_ndc};
use crate::sequencer::TriggerOutcome;

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Flythrough".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Open a window and drive `experience` until the window closes.
///
/// Each frame the pending input is applied (scroll offset, hover, click, `R`
/// to fly back to the reset stage, `Escape` to cancel a flight), the
/// experience is ticked by wall time, and the surface is cleared to the
/// current stage's background.
///
/// # Example
/// ```no_run
/// use flythrough::{AppConfig, Experience, ExperienceConfig};
///
/// let config = ExperienceConfig::portfolio()?;
/// let experience = Experience::from_config(&config)?;
/// flythrough::run(experience, AppConfig::new().title("Portfolio"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run(experience: Experience, config: AppConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FlythroughApp::Pending {
        config,
        experience: Some(experience),
    };
    event_loop.run_app(&mut app)?;

    match app {
        FlythroughApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

enum FlythroughApp {
    Pending {
        config: AppConfig,
        experience: Option<Experience>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        input: Input,
        experience: Experience,
        hovered: Option<Entity>,
    },
    Failed(RunError),
}

impl FlythroughApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        *self = FlythroughApp::Failed(error);
        event_loop.exit();
    }
}

fn create_window(
    event_loop: &ActiveEventLoop,
    config: &AppConfig,
) -> Result<(Arc<Window>, GpuContext), RunError> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = Arc::new(event_loop.create_window(window_attrs)?);
    let gpu = GpuContext::new(Arc::clone(&window))?;
    Ok((window, gpu))
}

fn report(action: &str, result: Result<Option<TriggerOutcome>, SequencerError>) {
    match result {
        Ok(Some(TriggerOutcome::Ignored)) => {
            log::debug!("{} ignored: transition in flight", action)
        }
        Ok(_) => {}
        Err(e) => log::warn!("{} failed: {}", action, e),
    }
}

impl ApplicationHandler for FlythroughApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let FlythroughApp::Pending { config, experience } = self else {
            return;
        };

        match create_window(event_loop, config) {
            Ok((window, gpu)) => {
                let Some(experience) = experience.take() else {
                    return;
                };
                window.request_redraw();
                *self = FlythroughApp::Running {
                    window,
                    gpu,
                    input: Input::new(),
                    experience,
                    hovered: None,
                };
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let FlythroughApp::Running {
            window,
            gpu,
            input,
            experience,
            hovered,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let aspect = gpu.aspect();
                let ndc = to_ndc(input.pointer(), gpu.width(), gpu.height());

                if input.scrolled() {
                    report("scroll", experience.handle_scroll(input.scroll_offset()));
                }
                if input.pointer_moved() {
                    let hit = experience.pick(ndc, aspect).map(|hit| hit.entity);
                    match (hovered.is_some(), hit.is_some()) {
                        (false, true) => window.set_cursor(CursorIcon::Pointer),
                        (true, false) => window.set_cursor(CursorIcon::Default),
                        _ => {}
                    }
                    *hovered = hit;
                }
                if input.clicked() {
                    report("click", experience.handle_click(ndc, aspect));
                }
                if input.key_pressed(KeyCode::KeyR) {
                    report("reset", experience.reset());
                }
                if input.key_pressed(KeyCode::Escape) && experience.cancel_transition() {
                    log::info!("flight cancelled");
                }

                if experience.frame().is_some() {
                    // The hit-test set changed under a resting pointer.
                    *hovered = None;
                    window.set_cursor(CursorIcon::Default);
                }

                match gpu.clear(experience.background()) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        self.fail(event_loop, RunError::OutOfMemory);
                        return;
                    }
                    Err(e) => log::warn!("skipped frame: {}", e),
                }

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
