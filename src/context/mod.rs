// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
pub mod glow_context;
pub mod recording;

use std::fmt::Debug;

use crate::color::Color;

/// Immediate-mode rendering context a [`crate::Texture`] draws through.
///
/// Every call assumes the context is current on the calling thread. Parameter
/// names and values are GL enums as exposed by `glow`.
pub trait RenderContext {
    type Texture: Copy + Eq + Debug;

    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn delete_texture(&self, texture: Self::Texture);
    fn bind_texture(&self, texture: Option<Self::Texture>);
    fn tex_parameter_i32(&self, parameter: u32, value: i32);
    /// Uploads `pixels` (RGBA, 8 bits per channel) to the bound texture.
    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: &[u8]);

    fn begin_quads(&self);
    fn color_4_f64(&self, color: Color);
    fn tex_coord_2_i32(&self, s: i32, t: i32);
    fn vertex_2_f64(&self, x: f64, y: f64);
    fn end(&self);
}
