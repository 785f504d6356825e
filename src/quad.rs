// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use nalgebra::Point2;

/// One side of a requested draw size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Use the texture's intrinsic size, or derive it from the other side.
    #[default]
    Auto,
    Fixed(f64),
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Fixed(value)
    }
}

impl From<Option<f64>> for Dimension {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Dimension::Auto, Dimension::Fixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadSize {
    pub width: Dimension,
    pub height: Dimension,
}

impl QuadSize {
    pub fn new(width: impl Into<Dimension>, height: impl Into<Dimension>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }

    /// Draw at the source image's native pixel size.
    pub fn intrinsic() -> Self {
        Self::default()
    }

    pub fn fixed(width: f64, height: f64) -> Self {
        Self::new(width, height)
    }

    /// Fixed width, height follows the aspect ratio.
    pub fn with_width(width: f64) -> Self {
        Self::new(width, Dimension::Auto)
    }

    /// Fixed height, width follows the aspect ratio.
    pub fn with_height(height: f64) -> Self {
        Self::new(Dimension::Auto, height)
    }

    /// Resolves the effective draw size against a source of `native_width` x
    /// `native_height` with the given aspect ratio.
    pub fn resolve(self, native_width: u32, native_height: u32, aspect_ratio: f64) -> (f64, f64) {
        match (self.width, self.height) {
            (Dimension::Auto, Dimension::Auto) => (native_width as f64, native_height as f64),
            (Dimension::Auto, Dimension::Fixed(height)) => (height * aspect_ratio, height),
            (Dimension::Fixed(width), Dimension::Auto) => (width, width / aspect_ratio),
            (Dimension::Fixed(width), Dimension::Fixed(height)) => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub tex_coord: [i32; 2],
    pub position: Point2<f64>,
}

/// Corners of an axis-aligned quad, in submission order: top-left, top-right,
/// bottom-right, bottom-left in texture space.
pub fn quad_vertices(position: Point2<f64>, width: f64, height: f64) -> [TexturedVertex; 4] {
    [
        TexturedVertex {
            tex_coord: [0, 0],
            position,
        },
        TexturedVertex {
            tex_coord: [1, 0],
            position: Point2::new(position.x + width, position.y),
        },
        TexturedVertex {
            tex_coord: [1, 1],
            position: Point2::new(position.x + width, position.y + height),
        },
        TexturedVertex {
            tex_coord: [0, 1],
            position: Point2::new(position.x, position.y + height),
        },
    ]
}
