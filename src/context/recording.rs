// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use nalgebra::Point2;

use super::RenderContext;
use crate::color::Color;
use crate::quad::TexturedVertex;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordedTexture(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateTexture(RecordedTexture),
    DeleteTexture(RecordedTexture),
    BindTexture(Option<RecordedTexture>),
    TexParameter { parameter: u32, value: i32 },
    TexImage { width: u32, height: u32, pixels: Vec<u8> },
    BeginQuads,
    Color(Color),
    TexCoord(i32, i32),
    Vertex(f64, f64),
    End,
}

/// One `begin_quads`..`end` block as seen by the context.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuad {
    pub texture: Option<RecordedTexture>,
    pub color: Color,
    pub vertices: Vec<TexturedVertex>,
}

impl RecordedQuad {
    pub fn width(&self) -> f64 {
        self.extent(|p| p.x)
    }

    pub fn height(&self) -> f64 {
        self.extent(|p| p.y)
    }

    fn extent(&self, axis: impl Fn(&Point2<f64>) -> f64) -> f64 {
        let values = self.vertices.iter().map(|v| axis(&v.position));
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() {
            max - min
        } else {
            0.0
        }
    }
}

/// Headless context that records the command stream instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: RefCell<Vec<GlCall>>,
    next_texture: Cell<u32>,
    live: RefCell<HashSet<RecordedTexture>>,
    fail_allocations: bool,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose texture allocations always fail.
    pub fn failing() -> Self {
        Self {
            fail_allocations: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn live_textures(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn drawn_quads(&self) -> Vec<RecordedQuad> {
        let mut quads = Vec::new();
        let mut bound = None;
        let mut color = Color::WHITE;
        let mut tex_coord = [0, 0];
        let mut current: Option<Vec<TexturedVertex>> = None;

        for call in self.calls.borrow().iter() {
            match call {
                GlCall::BindTexture(texture) => bound = *texture,
                GlCall::Color(c) => color = *c,
                GlCall::BeginQuads => current = Some(Vec::new()),
                GlCall::TexCoord(s, t) => tex_coord = [*s, *t],
                GlCall::Vertex(x, y) => {
                    if let Some(vertices) = current.as_mut() {
                        vertices.push(TexturedVertex {
                            tex_coord,
                            position: Point2::new(*x, *y),
                        });
                    }
                }
                GlCall::End => {
                    if let Some(vertices) = current.take() {
                        quads.push(RecordedQuad {
                            texture: bound,
                            color,
                            vertices,
                        });
                    }
                }
                _ => {}
            }
        }
        quads
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RenderContext for RecordingContext {
    type Texture = RecordedTexture;

    fn create_texture(&self) -> Result<RecordedTexture, String> {
        if self.fail_allocations {
            return Err("texture allocation refused".to_string());
        }
        let id = self.next_texture.get() + 1;
        self.next_texture.set(id);
        let texture = RecordedTexture(id);
        self.live.borrow_mut().insert(texture);
        self.record(GlCall::CreateTexture(texture));
        Ok(texture)
    }

    fn delete_texture(&self, texture: RecordedTexture) {
        self.live.borrow_mut().remove(&texture);
        self.record(GlCall::DeleteTexture(texture));
    }

    fn bind_texture(&self, texture: Option<RecordedTexture>) {
        self.record(GlCall::BindTexture(texture));
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        self.record(GlCall::TexParameter { parameter, value });
    }

    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        self.record(GlCall::TexImage {
            width,
            height,
            pixels: pixels.to_vec(),
        });
    }

    fn begin_quads(&self) {
        self.record(GlCall::BeginQuads);
    }

    fn color_4_f64(&self, color: Color) {
        self.record(GlCall::Color(color));
    }

    fn tex_coord_2_i32(&self, s: i32, t: i32) {
        self.record(GlCall::TexCoord(s, t));
    }

    fn vertex_2_f64(&self, x: f64, y: f64) {
        self.record(GlCall::Vertex(x, y));
    }

    fn end(&self) {
        self.record(GlCall::End);
    }
}
