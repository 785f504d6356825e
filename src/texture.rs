// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use std::path::Path;
use std::rc::Rc;

use image::DynamicImage;
use log::{debug, error, trace};
use nalgebra::Point2;
use thiserror::Error;

use crate::bitmap::ArgbBitmap;
use crate::color::Color;
use crate::context::RenderContext;
use crate::decode::{decode_file, DecodedImage};
use crate::quad::{quad_vertices, QuadSize};
use crate::sampling::{sampling_parameters, Filter};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Failed to allocate texture: {0}")]
    Allocation(String),
}

/// A GPU texture drawn as a single textured quad.
///
/// The handle is allocated on construction and released when the texture is
/// dropped, which must happen while the underlying GL context is still current.
pub struct Texture<C: RenderContext> {
    ctx: Rc<C>,
    handle: C::Texture,
    width: u32,
    height: u32,
    aspect_ratio: f64,
}

impl<C: RenderContext> Texture<C> {
    fn allocate(ctx: &Rc<C>) -> Result<Self, TextureError> {
        let handle = ctx.create_texture().map_err(TextureError::Allocation)?;
        Ok(Self {
            ctx: Rc::clone(ctx),
            handle,
            width: 0,
            height: 0,
            aspect_ratio: 0.0,
        })
    }

    /// Loads the image at `path`.
    ///
    /// A file that cannot be decoded is logged and yields a zero-sized
    /// texture that draws nothing visible; only handle allocation can fail.
    pub fn from_path(
        ctx: &Rc<C>,
        path: impl AsRef<Path>,
        filter: Filter,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let mut texture = Self::allocate(ctx)?;
        match decode_file(path) {
            Ok(decoded) => texture.load_decoded(&decoded, filter),
            Err(e) => {
                error!("Failed to load texture file: {}", path.display());
                debug!("Decoder reported: {}", e);
            }
        }
        Ok(texture)
    }

    pub fn from_bitmap(
        ctx: &Rc<C>,
        bitmap: &ArgbBitmap,
        filter: Filter,
    ) -> Result<Self, TextureError> {
        let mut texture = Self::allocate(ctx)?;
        texture.set_dimensions(bitmap.width(), bitmap.height());
        texture.upload(&bitmap.to_rgba_bottom_up(), filter);
        Ok(texture)
    }

    /// Uploads an image that was already decoded, flipping it like [`Texture::from_path`].
    pub fn from_image(
        ctx: &Rc<C>,
        image: &DynamicImage,
        filter: Filter,
    ) -> Result<Self, TextureError> {
        let mut texture = Self::allocate(ctx)?;
        texture.load_decoded(&DecodedImage::from_image(image), filter);
        Ok(texture)
    }

    fn load_decoded(&mut self, decoded: &DecodedImage, filter: Filter) {
        self.set_dimensions(decoded.width, decoded.height);
        self.upload(&decoded.pixels, filter);
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.aspect_ratio = width as f64 / height as f64;
    }

    fn upload(&self, pixels: &[u8], filter: Filter) {
        debug!(
            "Uploading {}x{} texture {:?} ({:?} filtering)",
            self.width, self.height, self.handle, filter
        );
        self.bind();
        for (parameter, value) in sampling_parameters(filter) {
            self.ctx.tex_parameter_i32(parameter, value);
        }
        self.ctx.tex_image_rgba8(self.width, self.height, pixels);
        self.unbind();
    }

    /// Draws the texture with its corner at `position`, tinted by `color`.
    pub fn render(&self, position: Point2<f64>, size: QuadSize, color: Color) {
        let (width, height) = size.resolve(self.width, self.height, self.aspect_ratio);
        trace!(
            "Rendering texture {:?} at ({}, {}) as {}x{}",
            self.handle,
            position.x,
            position.y,
            width,
            height
        );

        self.bind();
        self.ctx.begin_quads();
        self.ctx.color_4_f64(color);
        for vertex in quad_vertices(position, width, height) {
            self.ctx
                .tex_coord_2_i32(vertex.tex_coord[0], vertex.tex_coord[1]);
            self.ctx.vertex_2_f64(vertex.position.x, vertex.position.y);
        }
        self.ctx.end();
        self.unbind();
    }

    fn bind(&self) {
        self.ctx.bind_texture(Some(self.handle));
    }

    fn unbind(&self) {
        self.ctx.bind_texture(None);
    }

    pub fn handle(&self) -> C::Texture {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// False for a texture whose source failed to decode.
    pub fn is_loaded(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl<C: RenderContext> Drop for Texture<C> {
    fn drop(&mut self) {
        self.ctx.delete_texture(self.handle);
    }
}

impl<C: RenderContext> std::fmt::Debug for Texture<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("aspect_ratio", &self.aspect_ratio)
            .finish()
    }
}
