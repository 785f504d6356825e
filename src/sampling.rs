// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use serde::{Deserialize, Serialize};

/// Minification and magnification filter applied to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

impl Filter {
    pub fn gl_value(self) -> i32 {
        match self {
            Filter::Linear => glow::LINEAR as i32,
            Filter::Nearest => glow::NEAREST as i32,
        }
    }
}

impl From<bool> for Filter {
    /// `true` selects nearest-neighbour sampling.
    fn from(nearest: bool) -> Self {
        if nearest {
            Filter::Nearest
        } else {
            Filter::Linear
        }
    }
}

/// The `(parameter, value)` pairs set on every upload.
pub fn sampling_parameters(filter: Filter) -> [(u32, i32); 4] {
    [
        (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_BORDER as i32),
        (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_BORDER as i32),
        (glow::TEXTURE_MIN_FILTER, filter.gl_value()),
        (glow::TEXTURE_MAG_FILTER, filter.gl_value()),
    ]
}
