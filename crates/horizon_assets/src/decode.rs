//! Decoded asset payloads.
//!
//! Models are parsed glTF documents (JSON `.gltf` or binary `.glb`), textures
//! are decoded into tightly packed RGBA8 pixels. Both are handed out behind
//! `Arc`s and must be treated as read-only by every holder.

use std::sync::Arc;

use horizon_core::AssetError;

use crate::record::AssetKind;

/// A parsed glTF model.
pub struct Model {
    url: String,
    document: gltf::Document,
    blob: Option<Vec<u8>>,
    byte_len: usize,
}

impl Model {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn document(&self) -> &gltf::Document {
        &self.document
    }

    /// Embedded binary chunk of a `.glb`, if any.
    #[must_use]
    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// Size of the downloaded file.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.document.meshes().count()
    }

    #[must_use]
    pub fn animation_names(&self) -> Vec<String> {
        self.document
            .animations()
            .map(|animation| {
                animation
                    .name()
                    .map_or_else(|| format!("animation_{}", animation.index()), str::to_string)
            })
            .collect()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("url", &self.url)
            .field("meshes", &self.mesh_count())
            .field("byte_len", &self.byte_len)
            .finish_non_exhaustive()
    }
}

/// A decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub type ModelHandle = Arc<Model>;
pub type TextureHandle = Arc<TextureImage>;

/// A loaded payload as stored by the cache.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Model(ModelHandle),
    Texture(TextureHandle),
}

impl LoadedAsset {
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Model(_) => AssetKind::Model,
            Self::Texture(_) => AssetKind::Texture,
        }
    }

    #[must_use]
    pub fn into_model(self) -> Option<ModelHandle> {
        match self {
            Self::Model(model) => Some(model),
            Self::Texture(_) => None,
        }
    }

    #[must_use]
    pub fn into_texture(self) -> Option<TextureHandle> {
        match self {
            Self::Texture(texture) => Some(texture),
            Self::Model(_) => None,
        }
    }
}

pub(crate) fn decode(kind: AssetKind, url: &str, bytes: Vec<u8>) -> Result<LoadedAsset, AssetError> {
    match kind {
        AssetKind::Model => decode_model(url, bytes).map(|m| LoadedAsset::Model(Arc::new(m))),
        AssetKind::Texture => {
            decode_texture(url, &bytes).map(|t| LoadedAsset::Texture(Arc::new(t)))
        }
    }
}

fn decode_model(url: &str, bytes: Vec<u8>) -> Result<Model, AssetError> {
    let byte_len = bytes.len();
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(&bytes).map_err(|e| AssetError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(Model {
        url: url.to_string(),
        document,
        blob,
        byte_len,
    })
}

fn decode_texture(url: &str, bytes: &[u8]) -> Result<TextureImage, AssetError> {
    let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureImage {
        url: url.to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}
