use std::sync::Arc;

use winit::window::Window;

use crate::error::Result;

/// Device, queue and the window's swapchain surface.
///
/// The pet is drawn entirely by egui, so the only pass owned here is the
/// transparent clear.
pub struct GpuState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

pub struct FrameContext {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

#[cfg(windows)]
fn instance_descriptor() -> wgpu::InstanceDescriptor {
    // Vulkan WSI on Windows cannot present with per-pixel alpha; DX12 through
    // a DirectComposition visual can.
    wgpu::InstanceDescriptor {
        backends: wgpu::Backends::DX12,
        backend_options: wgpu::BackendOptions {
            dx12: wgpu::Dx12BackendOptions {
                presentation_system: wgpu_types::Dx12SwapchainKind::DxgiFromVisual,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(not(windows))]
fn instance_descriptor() -> wgpu::InstanceDescriptor {
    wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    }
}

fn pick_alpha_mode(modes: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|m| modes.contains(m))
    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

impl GpuState {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let physical = window.inner_size();
        let instance = wgpu::Instance::new(&instance_descriptor());
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            // One small sprite; no reason to wake a discrete GPU.
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {:?} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("bongocat_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            ..Default::default()
        }))?;

        let caps = surface.get_capabilities(&adapter);
        // egui_wgpu expects a non-sRGB target.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let alpha_mode = pick_alpha_mode(&caps.alpha_modes);
        if alpha_mode == wgpu::CompositeAlphaMode::Auto {
            log::warn!(
                "No transparent composite alpha mode in {:?}; background may be opaque",
                caps.alpha_modes
            );
        }
        log::info!("Surface: format={format:?}, alpha_mode={alpha_mode:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical.width.max(1),
            height: physical.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    /// Reconfigure for a new physical size. Zero sizes (minimised) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Acquire the next surface texture, or `None` to skip this frame.
    pub fn begin_frame(&self) -> Option<FrameContext> {
        let output = self
            .surface
            .get_current_texture()
            .map_err(|e| match e {
                // Stale after a resize or display change; try again next frame.
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    self.surface.configure(&self.device, &self.config)
                }
                wgpu::SurfaceError::Timeout => log::debug!("Surface timed out"),
                other => log::warn!("Dropping frame: {other}"),
            })
            .ok()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pet_frame"),
            });

        Some(FrameContext {
            output,
            view,
            encoder,
        })
    }

    /// Clear to fully transparent and return a pass egui can draw into.
    pub fn begin_overlay_pass(
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'static> {
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pet_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.forget_lifetime()
    }

    pub fn finish_frame(
        &self,
        encoder: wgpu::CommandEncoder,
        output: wgpu::SurfaceTexture,
        uploads: Vec<wgpu::CommandBuffer>,
    ) {
        let mut buffers = uploads;
        buffers.push(encoder.finish());
        self.queue.submit(buffers);
        output.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_premultiplied_alpha() {
        use wgpu::CompositeAlphaMode::*;
        assert_eq!(pick_alpha_mode(&[Opaque, PostMultiplied, PreMultiplied]), PreMultiplied);
        assert_eq!(pick_alpha_mode(&[Opaque, PostMultiplied]), PostMultiplied);
        assert_eq!(pick_alpha_mode(&[Opaque]), Auto);
    }
}
