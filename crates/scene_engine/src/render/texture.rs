//! Texture resource

use std::rc::Rc;

use crate::assets::{Lifecycle, Resource, ResourceContext, ResourceError};

use super::api::{check_error, GpuHandle, GraphicsApi, TextureData};

/// Pixel source for a texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Image file decoded through the asset service
    File(String),
    /// Pixels supplied by code
    Pixels(Rc<TextureData>),
}

/// RGBA8 texture on the GPU
#[derive(Debug)]
pub struct Texture {
    lifecycle: Lifecycle,
    source: TextureSource,
    handle: Option<GpuHandle>,
    size: (u32, u32),
}

impl Texture {
    /// Texture decoded from an image file when it loads
    pub fn from_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, TextureSource::File(path.into()))
    }

    /// Texture over in-memory pixels
    pub fn from_pixels(name: impl Into<String>, data: TextureData) -> Self {
        Self::new(name, TextureSource::Pixels(Rc::new(data)))
    }

    /// Unloaded texture over `source`
    pub fn new(name: impl Into<String>, source: TextureSource) -> Self {
        Self {
            lifecycle: Lifecycle::new(name),
            source,
            handle: None,
            size: (0, 0),
        }
    }

    /// Handle while loaded
    pub fn handle(&self) -> Option<GpuHandle> {
        self.handle
    }

    /// Size in pixels of the last upload
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Bind to a sampler unit
    pub fn bind(&self, gpu: &mut dyn GraphicsApi, unit: u32) -> Result<(), ResourceError> {
        let handle = self.handle.ok_or_else(|| ResourceError::Failed {
            resource: self.name().to_string(),
            reason: "texture is not loaded".to_string(),
        })?;
        gpu.bind_texture(handle, unit)?;
        Ok(())
    }
}

impl Resource for Texture {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        let data = match &self.source {
            TextureSource::File(path) => ctx.assets.load_image(path)?,
            TextureSource::Pixels(data) => Rc::clone(data),
        };

        let handle = ctx.gpu.create_texture()?;
        self.handle = Some(handle);
        ctx.gpu.upload_texture(handle, &data)?;
        check_error(&mut *ctx.gpu, "upload_texture")?;

        self.size = (data.width, data.height);
        log::debug!("Texture '{}' uploaded ({}x{})", self.name(), data.width, data.height);
        Ok(())
    }

    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        if let Some(handle) = self.handle.take() {
            ctx.gpu.delete_texture(handle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{dispose, initialize, shared};
    use crate::testing::{basic_loader, TestServices};

    #[test]
    fn test_file_texture_round_trip() {
        let mut services = TestServices::with_loader(basic_loader());
        let texture = shared(Texture::from_file("checker", "textures/checker.png"));

        initialize(&*texture, &mut services.context()).unwrap();
        assert_eq!(texture.borrow().size(), (2, 2));
        texture.borrow().bind(&mut services.device, 0).unwrap();

        dispose(&*texture, &mut services.context()).unwrap();
        assert_eq!(services.device.live_handle_count(), 0);
        assert!(texture.borrow().handle().is_none());
    }

    #[test]
    fn test_malformed_pixels_release_handle_on_dispose() {
        let mut services = TestServices::new();
        let bad = TextureData {
            width: 4,
            height: 4,
            pixels: vec![0; 3],
        };
        let texture = shared(Texture::from_pixels("bad", bad));

        assert!(initialize(&*texture, &mut services.context()).is_err());
        assert_eq!(services.device.live_handle_count(), 1);

        dispose(&*texture, &mut services.context()).unwrap();
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let mut services = TestServices::new();
        let texture = shared(Texture::from_file("lost", "missing.png"));
        assert!(matches!(
            initialize(&*texture, &mut services.context()),
            Err(ResourceError::Asset(_))
        ));
        dispose(&*texture, &mut services.context()).unwrap();
    }
}
