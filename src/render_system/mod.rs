pub mod fixed_function;
pub mod lighting;
pub mod model;
pub mod vertex;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use vulkano_win::VkSurfaceBuild;
use winit::{
    dpi::LogicalSize,
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

use vulkano::{
    buffer::{
        allocator::{SubbufferAllocator, SubbufferAllocatorCreateInfo},
        Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer,
    },
    command_buffer::{
        allocator::{StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo},
        AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer,
        RenderPassBeginInfo, SubpassContents,
    },
    descriptor_set::{
        allocator::StandardDescriptorSetAllocator, PersistentDescriptorSet, WriteDescriptorSet,
    },
    device::{
        physical::PhysicalDeviceType, Device, DeviceCreateInfo, DeviceExtensions, Queue,
        QueueCreateInfo, QueueFlags,
    },
    format::{ClearValue, Format},
    image::{view::ImageView, AttachmentImage, ImageAccess, ImageUsage, SwapchainImage},
    instance::{Instance, InstanceCreateInfo},
    memory::allocator::{AllocationCreateInfo, MemoryUsage, StandardMemoryAllocator},
    pipeline::{graphics::viewport::Viewport, GraphicsPipeline, Pipeline, PipelineBindPoint},
    render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass},
    swapchain::{
        self, AcquireError, PresentMode, Swapchain, SwapchainAcquireFuture, SwapchainCreateInfo,
        SwapchainCreationError, SwapchainPresentInfo,
    },
    sync::{self, FlushError, GpuFuture},
    VulkanLibrary,
};

use crate::config::WindowSettings;

const DEPTH_FORMAT: Format = Format::D16_UNORM;

pub fn get_render_pass(
    device: &Arc<Device>,
    swapchain: &Arc<Swapchain>,
) -> anyhow::Result<Arc<RenderPass>> {
    let render_pass = vulkano::single_pass_renderpass!(
        device.clone(),
        attachments: {
            color: {
                load: Clear,
                store: Store,
                format: swapchain.image_format(),
                samples: 1,
            },
            depth: {
                load: Clear,
                store: DontCare,
                format: DEPTH_FORMAT,
                samples: 1,
            }
        },
        pass: {
            color: [color],
            depth_stencil: {depth}
        }
    )
    .context("failed to create render pass")?;

    Ok(render_pass)
}

pub fn gen_framebuffers(
    images: &[Arc<SwapchainImage>],
    render_pass: &Arc<RenderPass>,
    depth_buffer: &Arc<ImageView<AttachmentImage>>,
) -> anyhow::Result<Vec<Arc<Framebuffer>>> {
    images
        .iter()
        .map(|image| -> anyhow::Result<Arc<Framebuffer>> {
            let view = ImageView::new_default(image.clone())?;
            let framebuffer = Framebuffer::new(
                render_pass.clone(),
                FramebufferCreateInfo {
                    attachments: vec![view, depth_buffer.clone()],
                    ..Default::default()
                },
            )?;
            Ok(framebuffer)
        })
        .collect()
}

fn create_depth_buffer(
    memory_allocator: &StandardMemoryAllocator,
    dimensions: [u32; 2],
) -> anyhow::Result<Arc<ImageView<AttachmentImage>>> {
    let image = AttachmentImage::transient(memory_allocator, dimensions, DEPTH_FORMAT)
        .context("failed to allocate depth buffer")?;
    Ok(ImageView::new_default(image)?)
}

/// Owns the window, the Vulkan device and the swapchain, and records one
/// render pass per frame.
pub struct RenderSystem {
    pub render_stage: RenderStage,

    window: Arc<Window>,
    viewport: Viewport,
    device: Arc<Device>,
    queue: Arc<Queue>,
    swapchain: Arc<Swapchain>,
    images: Vec<Arc<SwapchainImage>>,
    framebuffers: Vec<Arc<Framebuffer>>,
    render_pass: Arc<RenderPass>,
    depth_buffer: Arc<ImageView<AttachmentImage>>,

    /// One clear value per attachment: transparent black colour, far depth.
    clear_values: Vec<Option<ClearValue>>,

    memory_allocator: Arc<StandardMemoryAllocator>,
    descriptor_set_allocator: StandardDescriptorSetAllocator,
    command_buffer_allocator: StandardCommandBufferAllocator,
    uniform_buffer_allocator: SubbufferAllocator,

    commands: Option<AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>>,
    current_image_index: u32,
    acquire_future: Option<SwapchainAcquireFuture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Stopped,
    Recording,
    NeedsRedraw,
}

impl RenderSystem {
    const CLEAR_COLOUR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

    ///
    /// Open the window and bring up everything needed to present into it.
    ///
    pub fn new(
        event_loop: &EventLoop<()>,
        settings: &WindowSettings,
    ) -> anyhow::Result<(Self, Option<Box<dyn GpuFuture>>)> {
        let library = VulkanLibrary::new().context("failed to load the Vulkan library")?;
        let required_extensions = vulkano_win::required_extensions(&library);

        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                enabled_extensions: required_extensions,
                enumerate_portability: true,
                ..Default::default()
            },
        )
        .context("failed to create Vulkan instance")?;

        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let surface = WindowBuilder::new()
            .with_title(&settings.title)
            .with_inner_size(LogicalSize::new(settings.width, settings.height))
            .with_resizable(false)
            .build_vk_surface(event_loop, instance.clone())
            .context("failed to create window surface")?;

        let window = surface
            .object()
            .ok_or_else(|| anyhow!("surface is not backed by a window"))?
            .clone()
            .downcast::<Window>()
            .map_err(|_| anyhow!("surface is not backed by a winit window"))?;

        let (physical_device, queue_index) = instance
            .enumerate_physical_devices()
            .context("failed to enumerate physical devices")?
            .filter(|device| device.supported_extensions().contains(&device_extensions))
            .filter_map(|device| {
                device
                    .queue_family_properties()
                    .iter()
                    .enumerate()
                    .position(|(index, queue_props)| {
                        queue_props.queue_flags.contains(QueueFlags::GRAPHICS)
                            && device
                                .surface_support(index as u32, &surface)
                                .unwrap_or(false)
                    })
                    .map(|queue_index| (device, queue_index as u32))
            })
            .min_by_key(|(device, _)| match device.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 0,
                PhysicalDeviceType::IntegratedGpu => 1,
                PhysicalDeviceType::VirtualGpu => 2,
                PhysicalDeviceType::Cpu => 3,
                _ => 4,
            })
            .ok_or_else(|| anyhow!("no Vulkan device can present to this window"))?;

        log::info!(
            "using {} ({:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type
        );

        let (device, mut queues) = Device::new(
            physical_device.clone(),
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index: queue_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                ..Default::default()
            },
        )
        .context("failed to create device")?;

        let queue = queues
            .next()
            .ok_or_else(|| anyhow!("device was created without a queue"))?;

        let (swapchain, images) = {
            let image_format = physical_device
                .surface_formats(&surface, Default::default())
                .context("failed to query surface formats")?
                .first()
                .map(|(format, _)| *format);

            let device_capabilities = physical_device
                .surface_capabilities(&surface, Default::default())
                .context("failed to get surface capabilities")?;

            let alpha = device_capabilities
                .supported_composite_alpha
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("surface supports no composite alpha mode"))?;

            Swapchain::new(
                device.clone(),
                surface.clone(),
                SwapchainCreateInfo {
                    min_image_count: device_capabilities.min_image_count + 1,
                    image_format,
                    image_extent: window.inner_size().into(),
                    image_usage: ImageUsage::COLOR_ATTACHMENT,
                    composite_alpha: alpha,
                    present_mode: if settings.vsync {
                        PresentMode::Fifo
                    } else {
                        PresentMode::Immediate
                    },
                    ..Default::default()
                },
            )
            .context("failed to create swapchain")?
        };

        // Allocators
        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let descriptor_set_allocator = StandardDescriptorSetAllocator::new(device.clone());

        let command_buffer_allocator = StandardCommandBufferAllocator::new(
            device.clone(),
            StandardCommandBufferAllocatorCreateInfo::default(),
        );

        let uniform_buffer_allocator = SubbufferAllocator::new(
            memory_allocator.clone(),
            SubbufferAllocatorCreateInfo {
                buffer_usage: BufferUsage::UNIFORM_BUFFER,
                memory_usage: MemoryUsage::Upload,
                ..Default::default()
            },
        );

        let render_pass = get_render_pass(&device, &swapchain)?;

        let depth_buffer =
            create_depth_buffer(&memory_allocator, images[0].dimensions().width_height())?;
        let framebuffers = gen_framebuffers(&images, &render_pass, &depth_buffer)?;

        let viewport = Viewport {
            origin: [0.0, 0.0],
            dimensions: window.inner_size().into(),
            depth_range: 0.0..1.0,
        };

        let previous_frame_end = Some(Box::new(sync::now(device.clone())) as Box<dyn GpuFuture>);

        let rs = RenderSystem {
            render_stage: RenderStage::Stopped,

            window,
            viewport,
            device,
            queue,
            swapchain,
            images,
            framebuffers,
            render_pass,
            depth_buffer,

            clear_values: vec![Some(Self::CLEAR_COLOUR.into()), Some(1f32.into())],

            memory_allocator,
            descriptor_set_allocator,
            command_buffer_allocator,
            uniform_buffer_allocator,

            commands: None,
            current_image_index: 0,
            acquire_future: None,
        };

        Ok((rs, previous_frame_end))
    }

    pub fn device(&self) -> Arc<Device> {
        self.device.clone()
    }

    /// The only subpass of the render pass; every pipeline is built against it.
    pub fn subpass(&self) -> anyhow::Result<Subpass> {
        Subpass::from(self.render_pass.clone(), 0).ok_or_else(|| anyhow!("render pass has no subpass"))
    }

    pub fn aspect_ratio(&self) -> f32 {
        let [width, height] = self.viewport.dimensions;
        width / height
    }

    ///
    /// Upload vertices once into a host-visible vertex buffer.
    ///
    pub fn vertex_buffer<T, I>(&self, data: I) -> anyhow::Result<Subbuffer<[T]>>
    where
        T: BufferContents,
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let buffer = Buffer::from_iter(
            &self.memory_allocator,
            BufferCreateInfo {
                usage: BufferUsage::VERTEX_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                usage: MemoryUsage::Upload,
                ..Default::default()
            },
            data,
        )
        .context("failed to create vertex buffer")?;

        Ok(buffer)
    }

    pub fn uniform_buffer<T: BufferContents>(&self, data: T) -> anyhow::Result<Subbuffer<T>> {
        let uniform_buffer: Subbuffer<T> = self
            .uniform_buffer_allocator
            .allocate_sized()
            .context("failed to allocate uniform buffer")?;

        *uniform_buffer.write()? = data;

        Ok(uniform_buffer)
    }

    /// Descriptor set `set` of `pipeline`, with `buffer` at binding 0.
    pub fn descriptor_set<T: BufferContents>(
        &self,
        pipeline: &Arc<GraphicsPipeline>,
        set: usize,
        buffer: Subbuffer<T>,
    ) -> anyhow::Result<Arc<PersistentDescriptorSet>> {
        let layout = pipeline
            .layout()
            .set_layouts()
            .get(set)
            .ok_or_else(|| anyhow!("pipeline has no descriptor set {set}"))?;

        let descriptor_set = PersistentDescriptorSet::new(
            &self.descriptor_set_allocator,
            layout.clone(),
            [WriteDescriptorSet::buffer(0, buffer)],
        )
        .context("failed to create descriptor set")?;

        Ok(descriptor_set)
    }

    /// Swapchain is stale; rebuild it before the next frame.
    pub fn invalidate(&mut self) {
        self.render_stage = RenderStage::NeedsRedraw;
    }

    ///
    /// Acquire the next image and begin the render pass, clearing colour and
    /// depth. Leaves the stage `Stopped` if no image could be acquired, in
    /// which case the frame's draws are skipped.
    ///
    pub fn start_frame(&mut self) -> anyhow::Result<()> {
        match self.render_stage {
            RenderStage::Stopped => {}
            RenderStage::NeedsRedraw => {
                self.recreate_swapchain()?;
            }
            RenderStage::Recording => {
                log::warn!("frame started twice, dropping the previous one");
                self.commands = None;
            }
        }
        self.render_stage = RenderStage::Stopped;

        let dimensions = self.window.inner_size();
        if dimensions.width == 0 || dimensions.height == 0 {
            return Ok(());
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None) {
                Ok(r) => r,
                Err(AcquireError::OutOfDate) => {
                    self.render_stage = RenderStage::NeedsRedraw;
                    return Ok(());
                }
                Err(e) => return Err(e).context("failed to acquire next image"),
            };

        if suboptimal {
            log::debug!("suboptimal swapchain, recreating next frame");
        }

        let mut commands = AutoCommandBufferBuilder::primary(
            &self.command_buffer_allocator,
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .context("failed to create command buffer builder")?;

        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .ok_or_else(|| anyhow!("no framebuffer for swapchain image {image_index}"))?;

        commands
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: self.clear_values.clone(),
                    ..RenderPassBeginInfo::framebuffer(framebuffer.clone())
                },
                SubpassContents::Inline,
            )?
            .set_viewport(0, [self.viewport.clone()]);

        self.commands = Some(commands);
        self.current_image_index = image_index;
        self.acquire_future = Some(acquire_future);
        self.render_stage = if suboptimal {
            RenderStage::NeedsRedraw
        } else {
            RenderStage::Recording
        };

        Ok(())
    }

    ///
    /// Record one draw of `vertex_buffer` with `pipeline`. A no-op outside of
    /// a started frame.
    ///
    pub fn draw<T: BufferContents>(
        &mut self,
        pipeline: &Arc<GraphicsPipeline>,
        descriptor_set: Option<Arc<PersistentDescriptorSet>>,
        vertex_buffer: &Subbuffer<[T]>,
    ) -> anyhow::Result<()> {
        let Some(commands) = self.commands.as_mut() else {
            return Ok(());
        };

        commands.bind_pipeline_graphics(pipeline.clone());

        if let Some(set) = descriptor_set {
            commands.bind_descriptor_sets(
                PipelineBindPoint::Graphics,
                pipeline.layout().clone(),
                0,
                set,
            );
        }

        commands
            .bind_vertex_buffers(0, vertex_buffer.clone())
            .draw(vertex_buffer.len() as u32, 1, 0, 0)
            .context("failed to record draw")?;

        Ok(())
    }

    ///
    /// End the render pass, submit, and present.
    ///
    pub fn finish_frame(
        &mut self,
        previous_frame_end: &mut Option<Box<dyn GpuFuture>>,
    ) -> anyhow::Result<()> {
        let (Some(mut commands), Some(acquire_future)) =
            (self.commands.take(), self.acquire_future.take())
        else {
            return Ok(());
        };

        commands.end_render_pass()?;
        let command_buffer = commands.build().context("failed to build command buffer")?;

        if let Some(previous) = previous_frame_end.as_mut() {
            previous.cleanup_finished();
        }

        let previous = previous_frame_end
            .take()
            .unwrap_or_else(|| Box::new(sync::now(self.device.clone())) as Box<dyn GpuFuture>);

        let future = previous
            .join(acquire_future)
            .then_execute(self.queue.clone(), command_buffer)
            .context("failed to execute command buffer")?
            .then_swapchain_present(
                self.queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(
                    self.swapchain.clone(),
                    self.current_image_index,
                ),
            )
            .then_signal_fence_and_flush();

        match future {
            Ok(future) => {
                *previous_frame_end = Some(Box::new(future) as Box<_>);
            }
            Err(FlushError::OutOfDate) => {
                self.render_stage = RenderStage::NeedsRedraw;
                *previous_frame_end = Some(Box::new(sync::now(self.device.clone())) as Box<_>);
                return Ok(());
            }
            Err(e) => {
                *previous_frame_end = Some(Box::new(sync::now(self.device.clone())) as Box<_>);
                return Err(e).context("failed to flush frame");
            }
        }

        if self.render_stage == RenderStage::Recording {
            self.render_stage = RenderStage::Stopped;
        }

        Ok(())
    }

    pub fn recreate_swapchain(&mut self) -> anyhow::Result<()> {
        let new_dimensions = self.window.inner_size();

        let (new_swapchain, new_images) = match self.swapchain.recreate(SwapchainCreateInfo {
            image_extent: new_dimensions.into(),
            ..self.swapchain.create_info()
        }) {
            Ok(r) => r,
            Err(SwapchainCreationError::ImageExtentNotSupported { .. }) => return Ok(()),
            Err(e) => return Err(e).context("failed to recreate swapchain"),
        };

        self.swapchain = new_swapchain;
        self.images = new_images;

        self.depth_buffer = create_depth_buffer(
            &self.memory_allocator,
            self.images[0].dimensions().width_height(),
        )?;
        self.framebuffers = gen_framebuffers(&self.images, &self.render_pass, &self.depth_buffer)?;
        self.viewport.dimensions = new_dimensions.into();

        log::debug!(
            "recreated swapchain at {}x{}",
            new_dimensions.width,
            new_dimensions.height
        );

        Ok(())
    }
}
