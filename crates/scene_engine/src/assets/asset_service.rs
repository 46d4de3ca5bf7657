//! Asset source loading
//!
//! Reading files and decoding images is delegated to an [`AssetLoader`]. The
//! [`AssetService`] in front of it caches results by path so that several
//! scenes sharing a shader source read it once. The cache holds CPU data only;
//! GPU handles belong to the resources built from it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::render::api::TextureData;

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Nothing exists at the path
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Requested path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be decoded
    #[error("Failed to decode '{path}': {message}")]
    Decode {
        /// Requested path
        path: String,
        /// Decoder message
        message: String,
    },
}

/// File I/O and image decoding collaborator
pub trait AssetLoader {
    /// Read a UTF-8 text file such as a shader source
    fn read_text(&self, path: &str) -> Result<String, AssetError>;

    /// Read and decode an image into RGBA8 pixels
    fn load_image(&self, path: &str) -> Result<TextureData, AssetError>;
}

/// Loader backed by the file system, decoding images with the `image` crate
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    /// Resolve relative paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let requested = Path::new(path);
        if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn read_text(&self, path: &str) -> Result<String, AssetError> {
        let resolved = self.resolve(path);
        std::fs::read_to_string(&resolved).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(resolved.display().to_string())
            } else {
                AssetError::Io {
                    path: resolved.display().to_string(),
                    source,
                }
            }
        })
    }

    fn load_image(&self, path: &str) -> Result<TextureData, AssetError> {
        let resolved = self.resolve(path);
        if !resolved.exists() {
            return Err(AssetError::NotFound(resolved.display().to_string()));
        }
        let image = image::open(&resolved).map_err(|e| AssetError::Decode {
            path: resolved.display().to_string(),
            message: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        Ok(TextureData {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }
}

/// Loader serving assets registered in memory; used by headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLoader {
    texts: HashMap<String, String>,
    images: HashMap<String, TextureData>,
}

impl MemoryAssetLoader {
    /// Empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a text file
    pub fn with_text(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.texts.insert(path.into(), contents.into());
        self
    }

    /// Builder: register a decoded image
    pub fn with_image(mut self, path: impl Into<String>, image: TextureData) -> Self {
        self.images.insert(path.into(), image);
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn read_text(&self, path: &str) -> Result<String, AssetError> {
        self.texts
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn load_image(&self, path: &str) -> Result<TextureData, AssetError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Caching front for an [`AssetLoader`]
pub struct AssetService {
    loader: Box<dyn AssetLoader>,
    texts: HashMap<String, Rc<str>>,
    images: HashMap<String, Rc<TextureData>>,
    cache_hits: u64,
}

impl AssetService {
    /// Wrap a loader
    pub fn new(loader: impl AssetLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            texts: HashMap::new(),
            images: HashMap::new(),
            cache_hits: 0,
        }
    }

    /// Read a text asset, cached by path
    pub fn read_text(&mut self, path: &str) -> Result<Rc<str>, AssetError> {
        if let Some(text) = self.texts.get(path) {
            self.cache_hits += 1;
            return Ok(Rc::clone(text));
        }
        let text: Rc<str> = self.loader.read_text(path)?.into();
        log::debug!("Loaded text asset '{path}' ({} bytes)", text.len());
        self.texts.insert(path.to_string(), Rc::clone(&text));
        Ok(text)
    }

    /// Load an image asset, cached by path
    pub fn load_image(&mut self, path: &str) -> Result<Rc<TextureData>, AssetError> {
        if let Some(image) = self.images.get(path) {
            self.cache_hits += 1;
            return Ok(Rc::clone(image));
        }
        let image = Rc::new(self.loader.load_image(path)?);
        log::debug!("Loaded image asset '{path}' ({}x{})", image.width, image.height);
        self.images.insert(path.to_string(), Rc::clone(&image));
        Ok(image)
    }

    /// Drop one cached entry so the next request reads it again
    pub fn evict(&mut self, path: &str) -> bool {
        let text = self.texts.remove(path).is_some();
        let image = self.images.remove(path).is_some();
        text || image
    }

    /// Number of cached entries
    pub fn cached_count(&self) -> usize {
        self.texts.len() + self.images.len()
    }

    /// Requests served from the cache
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Release every cached asset
    pub fn dispose(&mut self) {
        log::info!(
            "Disposing asset service ({} cached assets, {} cache hits)",
            self.cached_count(),
            self.cache_hits
        );
        self.texts.clear();
        self.images.clear();
    }
}

impl std::fmt::Debug for AssetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetService")
            .field("texts", &self.texts.len())
            .field("images", &self.images.len())
            .field("cache_hits", &self.cache_hits)
            .finish_non_exhaustive()
    }
}
