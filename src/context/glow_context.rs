// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glow::HasContext;
use log::{debug, trace, warn};
use nalgebra::Matrix4;
use thiserror::Error;

use super::RenderContext;
use crate::color::Color;

#[derive(Debug, Error)]
pub enum GlowContextError {
    #[error("Failed to create shader: {0}")]
    CreateShader(String),

    #[error("Shader compilation failed: {0}")]
    CompileShader(String),

    #[error("Program linking failed: {0}")]
    LinkProgram(String),

    #[error("Failed to create buffer: {0}")]
    CreateBuffer(String),
}

const VERTEX_SHADER: &str = r#"#version 330 core
uniform mat4 u_projection;
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_tex_coord;
layout(location = 2) in vec4 a_color;
out vec2 v_tex_coord;
out vec4 v_color;

void main() {
    v_tex_coord = a_tex_coord;
    v_color = a_color;
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
uniform sampler2D u_texture;
in vec2 v_tex_coord;
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color * texture(u_texture, v_tex_coord);
}
"#;

#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ImmediateVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
}

const STRIDE: i32 = std::mem::size_of::<ImmediateVertex>() as i32;

/// Turns each group of four quad corners into two triangles (0,1,2 and 0,2,3).
/// A trailing incomplete quad is dropped, as GL does.
pub fn expand_quads(vertices: &[ImmediateVertex]) -> Vec<ImmediateVertex> {
    let mut triangles = Vec::with_capacity(vertices.len() / 4 * 6);
    for quad in vertices.chunks_exact(4) {
        for index in [0, 1, 2, 0, 2, 3] {
            triangles.push(quad[index]);
        }
    }
    triangles
}

/// Orthographic projection over `width` x `height` units with the origin at
/// the bottom-left corner.
pub fn ortho(width: f32, height: f32) -> Matrix4<f32> {
    Matrix4::new_orthographic(0.0, width, 0.0, height, -1.0, 1.0)
}

/// Runs the registered deletions, newest first, unless setup reaches
/// [`SetupGuard::commit`].
struct SetupGuard<'a> {
    undo: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> SetupGuard<'a> {
    fn new() -> Self {
        Self { undo: Vec::new() }
    }

    fn on_failure(&mut self, undo: impl FnOnce() + 'a) {
        self.undo.push(Box::new(undo));
    }

    fn commit(mut self) {
        self.undo.clear();
    }
}

impl Drop for SetupGuard<'_> {
    fn drop(&mut self) {
        while let Some(undo) = self.undo.pop() {
            undo();
        }
    }
}

#[derive(Default)]
struct ImmediateState {
    in_quads: bool,
    color: [f32; 4],
    tex_coord: [f32; 2],
    vertices: Vec<ImmediateVertex>,
}

/// [`RenderContext`] over a core-profile `glow` context.
///
/// Immediate-mode calls are collected between `begin_quads` and `end` and
/// drawn on `end` with the currently bound texture on unit 0.
pub struct GlowContext {
    gl: Rc<glow::Context>,
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    u_projection: Option<glow::UniformLocation>,
    u_texture: Option<glow::UniformLocation>,
    projection: Cell<Matrix4<f32>>,
    state: RefCell<ImmediateState>,
}

impl GlowContext {
    pub fn new(gl: Rc<glow::Context>) -> Result<Self, GlowContextError> {
        unsafe {
            let context: &glow::Context = &gl;
            let mut guard = SetupGuard::new();

            let program = Self::compile_program(context)?;
            guard.on_failure(move || context.delete_program(program));

            let vao = context
                .create_vertex_array()
                .map_err(GlowContextError::CreateBuffer)?;
            guard.on_failure(move || context.delete_vertex_array(vao));

            let vbo = context
                .create_buffer()
                .map_err(GlowContextError::CreateBuffer)?;
            guard.on_failure(move || context.delete_buffer(vbo));

            context.bind_vertex_array(Some(vao));
            context.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            context.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, STRIDE, 0);
            context.enable_vertex_attrib_array(0);
            context.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, STRIDE, 8);
            context.enable_vertex_attrib_array(1);
            context.vertex_attrib_pointer_f32(2, 4, glow::FLOAT, false, STRIDE, 16);
            context.enable_vertex_attrib_array(2);
            context.bind_vertex_array(None);
            context.bind_buffer(glow::ARRAY_BUFFER, None);

            let u_projection = context.get_uniform_location(program, "u_projection");
            let u_texture = context.get_uniform_location(program, "u_texture");
            guard.commit();
            debug!("Immediate-mode program ready");

            Ok(Self {
                gl,
                program,
                vao,
                vbo,
                u_projection,
                u_texture,
                projection: Cell::new(Matrix4::identity()),
                state: RefCell::new(ImmediateState {
                    color: Color::WHITE.to_array_f32(),
                    ..ImmediateState::default()
                }),
            })
        }
    }

    unsafe fn compile_program(gl: &glow::Context) -> Result<glow::Program, GlowContextError> {
        let vertex_shader = Self::compile_shader(gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment_shader = match Self::compile_shader(gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)
        {
            Ok(shader) => shader,
            Err(e) => {
                gl.delete_shader(vertex_shader);
                return Err(e);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                gl.delete_shader(vertex_shader);
                gl.delete_shader(fragment_shader);
                return Err(GlowContextError::CreateShader(e));
            }
        };
        gl.attach_shader(program, vertex_shader);
        gl.attach_shader(program, fragment_shader);
        gl.link_program(program);

        gl.detach_shader(program, vertex_shader);
        gl.detach_shader(program, fragment_shader);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);

        if !gl.get_program_link_status(program) {
            let error = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(GlowContextError::LinkProgram(error));
        }
        Ok(program)
    }

    unsafe fn compile_shader(
        gl: &glow::Context,
        kind: u32,
        source: &str,
    ) -> Result<glow::Shader, GlowContextError> {
        let shader = gl
            .create_shader(kind)
            .map_err(GlowContextError::CreateShader)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let error = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(GlowContextError::CompileShader(error));
        }
        Ok(shader)
    }

    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    /// Projection applied to every quad drawn from now on.
    pub fn set_projection(&self, projection: Matrix4<f32>) {
        self.projection.set(projection);
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection.get()
    }

    fn flush(&self, vertices: &[ImmediateVertex]) {
        let triangles = expand_quads(vertices);
        if triangles.is_empty() {
            return;
        }
        trace!("Drawing {} immediate-mode vertices", triangles.len());
        let gl = &self.gl;
        unsafe {
            gl.use_program(Some(self.program));
            gl.uniform_matrix_4_f32_slice(
                self.u_projection.as_ref(),
                false,
                self.projection.get().as_slice(),
            );
            gl.uniform_1_i32(self.u_texture.as_ref(), 0);
            gl.active_texture(glow::TEXTURE0);

            gl.bind_vertex_array(Some(self.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&triangles),
                glow::STREAM_DRAW,
            );
            gl.draw_arrays(glow::TRIANGLES, 0, triangles.len() as i32);

            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }
}

impl RenderContext for GlowContext {
    type Texture = glow::Texture;

    fn create_texture(&self) -> Result<glow::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn bind_texture(&self, texture: Option<glow::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value) }
    }

    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    fn begin_quads(&self) {
        let mut state = self.state.borrow_mut();
        if state.in_quads {
            warn!("begin_quads called while a quad block is open; discarding pending vertices");
        }
        state.in_quads = true;
        state.vertices.clear();
    }

    fn color_4_f64(&self, color: Color) {
        self.state.borrow_mut().color = color.to_array_f32();
    }

    fn tex_coord_2_i32(&self, s: i32, t: i32) {
        self.state.borrow_mut().tex_coord = [s as f32, t as f32];
    }

    fn vertex_2_f64(&self, x: f64, y: f64) {
        let mut state = self.state.borrow_mut();
        if !state.in_quads {
            warn!("vertex submitted outside begin_quads/end; ignoring");
            return;
        }
        let vertex = ImmediateVertex {
            position: [x as f32, y as f32],
            tex_coord: state.tex_coord,
            color: state.color,
        };
        state.vertices.push(vertex);
    }

    fn end(&self) {
        let vertices = {
            let mut state = self.state.borrow_mut();
            state.in_quads = false;
            std::mem::take(&mut state.vertices)
        };
        self.flush(&vertices);
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_program(self.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use nalgebra::Vector4;

    fn corner(x: f32, y: f32) -> ImmediateVertex {
        ImmediateVertex {
            position: [x, y],
            ..ImmediateVertex::default()
        }
    }

    #[test]
    fn test_expand_quads_into_two_triangles() {
        let quad = [
            corner(0.0, 0.0),
            corner(1.0, 0.0),
            corner(1.0, 1.0),
            corner(0.0, 1.0),
        ];
        let triangles = expand_quads(&quad);
        let positions: Vec<[f32; 2]> = triangles.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 0.0],
                [1.0, 1.0],
                [0.0, 1.0]
            ]
        );
    }

    #[test]
    fn test_expand_quads_drops_incomplete_quad() {
        let vertices = vec![corner(0.0, 0.0); 7];
        assert_eq!(expand_quads(&vertices).len(), 6);
    }

    #[test]
    fn test_setup_guard_releases_in_reverse_order() {
        let released = RefCell::new(Vec::new());
        {
            let mut guard = SetupGuard::new();
            guard.on_failure(|| released.borrow_mut().push("program"));
            guard.on_failure(|| released.borrow_mut().push("vertex array"));
            guard.on_failure(|| released.borrow_mut().push("buffer"));
        }
        assert_eq!(
            *released.borrow(),
            vec!["buffer", "vertex array", "program"]
        );
    }

    #[test]
    fn test_setup_guard_releases_on_early_return() {
        let released = RefCell::new(Vec::new());
        let setup = || -> Result<(), String> {
            let mut guard = SetupGuard::new();
            guard.on_failure(|| released.borrow_mut().push("program"));
            Err::<(), String>("no vertex arrays left".to_string())?;
            guard.commit();
            Ok(())
        };

        assert!(setup().is_err());
        assert_eq!(*released.borrow(), vec!["program"]);
    }

    #[test]
    fn test_committed_setup_guard_keeps_objects() {
        let released = RefCell::new(Vec::<&str>::new());
        let mut guard = SetupGuard::new();
        guard.on_failure(|| released.borrow_mut().push("program"));
        guard.commit();
        assert!(released.borrow().is_empty());
    }

    #[test]
    fn test_vertex_layout_stride() {
        assert_eq!(STRIDE, 32);
    }

    #[test]
    fn test_ortho_has_bottom_left_origin() {
        let projection = ortho(800.0, 600.0);
        let origin = projection * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let top_right = projection * Vector4::new(800.0, 600.0, 0.0, 1.0);

        assert!(relative_eq!(origin.x, -1.0) && relative_eq!(origin.y, -1.0));
        assert!(relative_eq!(top_right.x, 1.0) && relative_eq!(top_right.y, 1.0));
    }
}
