use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

use vulkano::sync::GpuFuture;

use crate::{config::WindowSettings, render_system::RenderSystem, scenes::Scene};

/// Open the window, set `scene` up, and drive it until the window closes.
///
/// Every pass through the event loop is one tick: update, then record and
/// present a frame. Only returns if setup fails.
pub fn run<S: Scene + 'static>(settings: WindowSettings, mut scene: S) -> anyhow::Result<()> {
    let event_loop = EventLoop::new();
    let (mut render_system, mut previous_frame_end) = RenderSystem::new(&event_loop, &settings)?;

    scene.setup(&mut render_system)?;
    log::info!("{} is running", settings.title);

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                log::info!("window closed");
                *control_flow = ControlFlow::Exit;
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                render_system.invalidate();
            }
            Event::RedrawEventsCleared => {
                scene.update();

                if let Err(e) = render_frame(&mut render_system, &mut scene, &mut previous_frame_end) {
                    log::error!("frame failed: {e:#}");
                    *control_flow = ControlFlow::ExitWithCode(1);
                }
            }
            Event::LoopDestroyed => crate::logging::flush(),
            _ => {}
        }
    })
}

fn render_frame<S: Scene>(
    render_system: &mut RenderSystem,
    scene: &mut S,
    previous_frame_end: &mut Option<Box<dyn GpuFuture>>,
) -> anyhow::Result<()> {
    render_system.start_frame()?;
    scene.draw(render_system)?;
    render_system.finish_frame(previous_frame_end)
}
