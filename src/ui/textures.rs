use crate::{core::geo::TileCoord, Result};
use egui::{ColorImage, TextureHandle, TextureOptions};
use lru::LruCache;
use std::num::NonZeroUsize;

type TextureKey = (String, TileCoord);

/// Decodes PNG/JPEG tile bytes into an egui image
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// GPU textures of raster tiles, keyed by layer and tile
pub struct TileTextures {
    textures: LruCache<TextureKey, TextureHandle>,
    undecodable: LruCache<TextureKey, ()>,
}

impl TileTextures {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            textures: LruCache::new(capacity),
            undecodable: LruCache::new(capacity),
        }
    }

    /// Texture for a tile, uploading `bytes` on first use. None if the bytes
    /// are not an image; such tiles are not decoded again.
    pub fn get_or_load(
        &mut self,
        ctx: &egui::Context,
        layer_id: &str,
        coord: TileCoord,
        bytes: &[u8],
    ) -> Option<TextureHandle> {
        let key = (layer_id.to_string(), coord);
        if let Some(texture) = self.textures.get(&key) {
            return Some(texture.clone());
        }
        if self.undecodable.contains(&key) {
            return None;
        }

        match decode_tile(bytes) {
            Ok(image) => {
                let name = format!("{}/{}", layer_id, coord);
                let texture = ctx.load_texture(name, image, TextureOptions::LINEAR);
                self.textures.put(key, texture.clone());
                Some(texture)
            }
            Err(e) => {
                log::warn!("tile {} of layer '{}' is not an image: {}", coord, layer_id, e);
                self.undecodable.put(key, ());
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Default for TileTextures {
    fn default() -> Self {
        Self::new(256)
    }
}
