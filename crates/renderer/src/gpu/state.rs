use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::shading::ShadingParams;
use crate::texture::RasterTexture;

use super::context::GpuContext;
use super::pipeline::PipelineResources;
use super::uniforms::GlassUniforms;

/// GPU half of the glass pipeline: one swapchain plus the resources the
/// fragment program reads.
pub(crate) struct GpuState {
    // Declared first so the pipeline objects go before the device.
    resources: PipelineResources,
    context: GpuContext,
    frames: u64,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        background: &RasterTexture,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let resources = PipelineResources::new(
            &context.device,
            &context.queue,
            context.surface_format,
            background,
        )?;
        tracing::info!(
            width = context.size.width,
            height = context.size.height,
            format = ?context.surface_format,
            "GPU renderer initialised"
        );
        Ok(Self {
            resources,
            context,
            frames: 0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Draws one frame with `params` and presents it.
    pub(crate) fn render(&mut self, params: &ShadingParams) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = GlassUniforms::new(params, self.resources.texel);
        self.context.queue.write_buffer(
            &self.resources.uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("glass encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glass pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.resources.pipeline);
            render_pass.set_bind_group(0, &self.resources.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.frames += 1;
        Ok(())
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        tracing::debug!(frames = self.frames, "tearing down GPU renderer");
    }
}
