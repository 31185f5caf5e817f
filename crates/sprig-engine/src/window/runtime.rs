use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::StageConfig;
use crate::coords::Viewport;
use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction, WgpuBackend};
use crate::render::{RenderContext, responsive};

/// Window settings.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sprig".to_string(),
            initial_size: LogicalSize::new(800.0, 480.0),
            resizable: true,
        }
    }
}

/// Single-window event loop driving a [`RenderContext`].
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the render context and runs `app` until it
    /// asks to exit or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, stage: StageConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState {
            config,
            gpu_init,
            stage_config: Some(stage),
            app,
            stage: None,
            failure: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct Stage {
    window: Window,

    #[borrows(window)]
    #[covariant]
    render: RenderContext<WgpuBackend<'this>>,
}

struct RuntimeState<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    /// Taken when the stage is built.
    stage_config: Option<StageConfig>,
    app: A,

    stage: Option<Stage>,
    failure: Option<anyhow::Error>,
}

impl<A: App + 'static> RuntimeState<A> {
    fn build_stage(&mut self, event_loop: &ActiveEventLoop) -> Result<Stage> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let stage_config = self
            .stage_config
            .take()
            .context("render stage already built")?;

        let mut stage = Stage::try_new(window, |window| {
            let gpu = pollster::block_on(Gpu::new(window, gpu_init))?;
            let size = gpu.size();
            let backend = WgpuBackend::new(gpu).context("failed to create GPU backend")?;
            let mut render =
                RenderContext::new(backend, stage_config).context("failed to build render stage")?;
            responsive::apply(&mut render, physical_viewport(size))?;
            Ok::<_, anyhow::Error>(render)
        })?;

        stage.with_render_mut(|render| self.app.on_start(render))?;

        let view = stage.borrow_render().logical_size();
        info!("stage ready: logical {}x{}", view.width, view.height);
        Ok(stage)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl<A: App + 'static> ApplicationHandler for RuntimeState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.stage.is_some() {
            return;
        }

        match self.build_stage(event_loop) {
            Ok(stage) => {
                stage.borrow_window().request_redraw();
                self.stage = Some(stage);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the frame timer advances once per presented frame.
        if let Some(stage) = &self.stage {
            stage.borrow_window().request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.app.on_window_event(&event) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        let Some(stage) = self.stage.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.stage = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                stage.with_render_mut(|render| resize(render, size));
                stage.borrow_window().request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = stage.borrow_window().inner_size();
                stage.with_render_mut(|render| resize(render, size));
                stage.borrow_window().request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let app = &mut self.app;
                match stage.with_mut(|fields| draw_frame(app, fields.window, fields.render)) {
                    Ok(AppControl::Continue) => {}
                    Ok(AppControl::Exit) => event_loop.exit(),
                    Err(err) => self.fail(event_loop, err),
                }
            }

            _ => {}
        }
    }
}

fn draw_frame<A: App>(
    app: &mut A,
    window: &Window,
    render: &mut RenderContext<WgpuBackend<'_>>,
) -> Result<AppControl> {
    let size = render.backend().gpu().size();
    if size.width == 0 || size.height == 0 {
        return Ok(AppControl::Continue);
    }

    render.begin_frame();
    let control = app.on_frame(&mut FrameCtx {
        window,
        render: &mut *render,
    });
    render.end_frame();

    window.pre_present_notify();
    if let Err(err) = render.backend_mut().present() {
        let reason = err.to_string();
        let action = render.backend_mut().gpu_mut().handle_surface_error(err);
        surface_outcome(action, &reason)?;
    }

    Ok(control)
}

/// Turns a surface error action into the frame result. Only `Fatal` stops
/// the loop, and it does so as a runtime failure.
fn surface_outcome(action: SurfaceErrorAction, reason: &str) -> Result<()> {
    match action {
        SurfaceErrorAction::Fatal => Err(anyhow!("surface lost: {reason}")),
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
    }
}

/// Reconfigures the surface and recomputes the display layout. A zero size
/// (minimized) only updates the surface bookkeeping.
fn resize(render: &mut RenderContext<WgpuBackend<'_>>, size: PhysicalSize<u32>) {
    render.backend_mut().gpu_mut().resize(size);
    if size.width == 0 || size.height == 0 {
        return;
    }
    if let Err(err) = responsive::apply(render, physical_viewport(size)) {
        warn!("display resize to {}x{} rejected: {err}", size.width, size.height);
    }
}

fn physical_viewport(size: PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width as f32, size.height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_surface_error_is_a_failure() {
        let err = surface_outcome(SurfaceErrorAction::Fatal, "Out of memory").unwrap_err();
        assert_eq!(err.to_string(), "surface lost: Out of memory");
    }

    #[test]
    fn recoverable_surface_errors_keep_running() {
        assert!(surface_outcome(SurfaceErrorAction::Reconfigured, "Outdated").is_ok());
        assert!(surface_outcome(SurfaceErrorAction::SkipFrame, "Timeout").is_ok());
    }

    #[test]
    fn physical_size_maps_to_viewport() {
        let view = physical_viewport(PhysicalSize::new(1280, 720));
        assert_eq!(view, Viewport::new(1280.0, 720.0));
    }
}
