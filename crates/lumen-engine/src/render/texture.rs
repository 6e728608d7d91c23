use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Dims, EngineError, Result};

use super::RenderCtx;

/// Texture coordinate addressing outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

impl Wrap {
    fn address_mode(self) -> wgpu::AddressMode {
        match self {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
            Wrap::Mirror => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Decoded RGBA8 image shared between polygons via `Arc<Texture>`.
///
/// The GPU copy is created on first use and lives as long as the texture.
pub struct Texture {
    label: String,
    image: image::RgbaImage,
    srgb: bool,
    wrap: Wrap,
    gpu: OnceLock<TextureGpu>,
}

impl Texture {
    /// Decodes an image file. `srgb` marks color data that must be linearized
    /// on sampling (diffuse/emission maps); leave it off for specular masks.
    pub fn load(path: impl AsRef<Path>, srgb: bool) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| EngineError::resource(path, e).report())?
            .to_rgba8();

        log::debug!("texture loaded: {} ({}x{})", path.display(), image.width(), image.height());
        Self::from_image(path.display().to_string(), image, srgb)
    }

    /// Decodes an in-memory encoded image (png/jpeg/bmp).
    pub fn from_bytes(bytes: &[u8], srgb: bool) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_image("memory".to_string(), image, srgb)
    }

    /// Wraps raw RGBA8 pixels, row-major, top row first.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>, srgb: bool) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let len = pixels.len();
        let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            EngineError::dims("texture pixels", Dims::new(len, 1), Dims::new(expected, 1))
        })?;
        Self::from_image("rgba".to_string(), image, srgb)
    }

    /// Empty images are rejected; wgpu cannot create a zero-extent texture.
    fn from_image(label: String, image: image::RgbaImage, srgb: bool) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EngineError::resource(label, "image has no pixels").report());
        }
        Ok(Self {
            label,
            image,
            srgb,
            wrap: Wrap::default(),
            gpu: OnceLock::new(),
        })
    }

    /// Selects the addressing mode. Has no effect once the texture was uploaded.
    pub fn with_wrapping(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn wrap(&self) -> Wrap {
        self.wrap
    }

    #[inline]
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    /// Smallest alpha over all pixels (255 for an empty image).
    ///
    /// Anything below 255 means the texture needs the transparent path.
    pub fn min_alpha(&self) -> u8 {
        self.image.pixels().map(|p| p.0[3]).min().unwrap_or(u8::MAX)
    }

    pub(crate) fn gpu(&self, ctx: &RenderCtx<'_>) -> &TextureGpu {
        self.gpu.get_or_init(|| TextureGpu::upload(ctx, self))
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("label", &self.label)
            .field("size", &self.image.dimensions())
            .field("srgb", &self.srgb)
            .field("wrap", &self.wrap)
            .field("uploaded", &self.gpu.get().is_some())
            .finish()
    }
}

/// GPU copy of a [`Texture`] plus the sampler matching its wrap mode.
pub(crate) struct TextureGpu {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureGpu {
    fn upload(ctx: &RenderCtx<'_>, src: &Texture) -> Self {
        let (width, height) = src.image.dimensions();
        let format = if src.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let this = Self::from_pixels(ctx, &src.label, width, height, format, src.wrap, src.image.as_raw());
        log::debug!("texture uploaded: {} ({width}x{height})", src.label);
        this
    }

    /// 1×1 opaque white, bound where a polygon has no map.
    pub(crate) fn white(ctx: &RenderCtx<'_>) -> Self {
        Self::from_pixels(
            ctx,
            "white",
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            Wrap::Repeat,
            &[255, 255, 255, 255],
        )
    }

    fn from_pixels(
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        wrap: Wrap,
        pixels: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if width > 0 && height > 0 {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mode = wrap.address_mode();
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen texture sampler"),
            address_mode_u: mode,
            address_mode_v: mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }
}

impl Drop for TextureGpu {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_alpha_scans_every_pixel() {
        let px = vec![10, 20, 30, 255, 0, 0, 0, 128, 1, 1, 1, 200, 5, 5, 5, 255];
        let t = Texture::from_rgba(2, 2, px, true).unwrap();
        assert_eq!(t.min_alpha(), 128);
        assert_eq!(t.size(), (2, 2));
    }

    #[test]
    fn opaque_texture_has_full_alpha() {
        let t = Texture::from_rgba(1, 1, vec![0, 0, 0, 255], false).unwrap();
        assert_eq!(t.min_alpha(), 255);
    }

    #[test]
    fn pixel_count_must_match_size() {
        let r = Texture::from_rgba(2, 2, vec![0; 12], false);
        assert!(matches!(r, Err(EngineError::DimensionMismatch { .. })));
    }

    #[test]
    fn empty_images_are_rejected() {
        assert!(matches!(
            Texture::from_rgba(0, 0, Vec::new(), false),
            Err(EngineError::ResourceLoad { .. })
        ));
        assert!(matches!(
            Texture::from_rgba(4, 0, Vec::new(), false),
            Err(EngineError::ResourceLoad { .. })
        ));
    }

    #[test]
    fn wrapping_is_kept_until_upload() {
        let t = Texture::from_rgba(1, 1, vec![0; 4], false).unwrap().with_wrapping(Wrap::Mirror);
        assert_eq!(t.wrap(), Wrap::Mirror);
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        let r = Texture::from_bytes(b"not an image", true);
        assert!(matches!(r, Err(EngineError::Image(_))));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let r = Texture::load("definitely/not/here.png", true);
        assert!(matches!(r, Err(EngineError::ResourceLoad { .. })));
    }
}
