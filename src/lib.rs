// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! Loads images into GPU textures and draws them as tinted, axis-aligned quads
//! through an immediate-mode [`RenderContext`].

pub mod bitmap;
pub mod color;
pub mod context;
pub mod decode;
pub mod quad;
pub mod sampling;
pub mod settings;
pub mod texture;

pub use bitmap::{ArgbBitmap, BitmapError};
pub use color::Color;
pub use context::glow_context::{GlowContext, GlowContextError};
pub use context::recording::{GlCall, RecordingContext};
pub use context::RenderContext;
pub use quad::{Dimension, QuadSize};
pub use sampling::Filter;
pub use settings::{Settings, SettingsError};
pub use texture::{Texture, TextureError};
