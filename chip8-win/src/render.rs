use std::{fmt, rc::Rc};

use bytemuck::{Pod, Zeroable};
use chip8::{constants::*, prelude::Display};
use glow::{Context as GlowContext, HasContext};
use memoffset::offset_of;

use crate::error::AppError;

/// Clear colour around the letterboxed display.
const BORDER_COLOR: [f32; 4] = [29.0 / 255.0, 33.0 / 255.0, 40.0 / 255.0, 1.0];
const BACKGROUND_COLOR: [f32; 3] = [0.1, 0.12, 0.1];
const FOREGROUND_COLOR: [f32; 3] = [0.6, 0.95, 0.6];

const VERTEX_SHADER: &str = r#"
layout (location = 0) in vec2 a_pos;
layout (location = 1) in vec2 a_uv;

out vec2 v_uv;

void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
precision mediump float;

in vec2 v_uv;
out vec4 f_color;

uniform sampler2D u_display;
uniform vec3 u_background;
uniform vec3 u_foreground;

void main() {
    float lit = texture(u_display, v_uv).r;
    f_color = vec4(mix(u_background, u_foreground, lit), 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

/// Two triangles covering the viewport. Texture rows run top to bottom.
#[rustfmt::skip]
const QUAD: [Vertex; 6] = [
    Vertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] },
    Vertex { pos: [ 1.0, -1.0], uv: [1.0, 1.0] },
    Vertex { pos: [ 1.0,  1.0], uv: [1.0, 0.0] },
    Vertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] },
    Vertex { pos: [ 1.0,  1.0], uv: [1.0, 0.0] },
    Vertex { pos: [-1.0,  1.0], uv: [0.0, 0.0] },
];

pub struct Render {
    /// The interface to the loaded OpenGL function.
    gl: Rc<GlowContext>,
    info: OpenGLInfo,
    program: glow::Program,
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    texture: glow::Texture,
    /// Staging buffer for the display pixels.
    pixels: Vec<u32>,
    viewport: [i32; 4],
}

impl Render {
    pub fn new(gl: Rc<GlowContext>) -> Result<Self, AppError> {
        let info = OpenGLInfo::new(&gl);

        let program = unsafe { Self::create_program(&gl)? };
        let (vertex_array, vertex_buffer) = unsafe { Self::create_buffers(&gl)? };
        let texture = unsafe { Self::create_texture(&gl)? };

        Ok(Self {
            gl,
            info,
            program,
            vertex_array,
            vertex_buffer,
            texture,
            pixels: vec![PIXEL_OFF; DISPLAY_PIXEL_COUNT],
            viewport: [0, 0, 0, 0],
        })
    }

    unsafe fn create_program(gl: &GlowContext) -> Result<glow::Program, AppError> {
        let header = if gl.version().is_embedded {
            "#version 300 es"
        } else {
            "#version 330 core"
        };

        let program = gl.create_program().map_err(AppError::gl)?;
        let mut shaders = Vec::with_capacity(2);

        for (kind, source) in [
            (glow::VERTEX_SHADER, VERTEX_SHADER),
            (glow::FRAGMENT_SHADER, FRAGMENT_SHADER),
        ] {
            let shader = gl.create_shader(kind).map_err(AppError::gl)?;
            gl.shader_source(shader, &format!("{header}\n{source}"));
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                return Err(AppError::gl(gl.get_shader_info_log(shader)));
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }

        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            return Err(AppError::gl(gl.get_program_info_log(program)));
        }

        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        Ok(program)
    }

    unsafe fn create_buffers(
        gl: &GlowContext,
    ) -> Result<(glow::VertexArray, glow::Buffer), AppError> {
        let vertex_array = gl.create_vertex_array().map_err(AppError::gl)?;
        let vertex_buffer = gl.create_buffer().map_err(AppError::gl)?;

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD),
            glow::STATIC_DRAW,
        );

        let stride = std::mem::size_of::<Vertex>() as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, offset_of!(Vertex, pos) as i32);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, offset_of!(Vertex, uv) as i32);

        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok((vertex_array, vertex_buffer))
    }

    unsafe fn create_texture(gl: &GlowContext) -> Result<glow::Texture, AppError> {
        let texture = gl.create_texture().map_err(AppError::gl)?;

        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            DISPLAY_WIDTH as i32,
            DISPLAY_HEIGHT as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            None,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(texture)
    }

    /// Fit the display into the window, keeping its 2:1 aspect ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let (width, height) = (width as i32, height as i32);
        let aspect = DISPLAY_WIDTH as i32 / DISPLAY_HEIGHT as i32;

        let (w, h) = if width > height * aspect {
            (height * aspect, height)
        } else {
            (width, width / aspect)
        };

        self.viewport = [(width - w) / 2, (height - h) / 2, w, h];
    }

    pub fn clear_window(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe {
            self.gl.clear_color(red, green, blue, alpha);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Upload the display and draw it to the current surface.
    pub fn draw_display(&mut self, display: &Display) {
        display.write_pixels(&mut self.pixels, PIXEL_ON);

        let [r, g, b, a] = BORDER_COLOR;
        self.clear_window(r, g, b, a);

        let [x, y, w, h] = self.viewport;
        let gl = &self.gl;

        unsafe {
            gl.viewport(x, y, w, h);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                DISPLAY_WIDTH as i32,
                DISPLAY_HEIGHT as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(bytemuck::cast_slice(&self.pixels)),
            );

            gl.use_program(Some(self.program));
            let [r, g, b] = BACKGROUND_COLOR;
            gl.uniform_3_f32(gl.get_uniform_location(self.program, "u_background").as_ref(), r, g, b);
            let [r, g, b] = FOREGROUND_COLOR;
            gl.uniform_3_f32(gl.get_uniform_location(self.program, "u_foreground").as_ref(), r, g, b);
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_display").as_ref(), 0);

            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, QUAD.len() as i32);

            gl.bind_vertex_array(None);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    pub fn opengl_info(&self) -> &OpenGLInfo {
        &self.info
    }
}

impl Drop for Render {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.texture);
            self.gl.delete_buffer(self.vertex_buffer);
            self.gl.delete_vertex_array(self.vertex_array);
            self.gl.delete_program(self.program);
        }
    }
}

pub struct OpenGLInfo {
    pub version: String,
    pub renderer: String,
    pub vendor: String,
    pub shading_lang: String,
}

impl OpenGLInfo {
    pub fn new(gl: &GlowContext) -> Self {
        unsafe {
            Self {
                version: gl.get_parameter_string(glow::VERSION),
                renderer: gl.get_parameter_string(glow::RENDERER),
                vendor: gl.get_parameter_string(glow::VENDOR),
                shading_lang: gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            }
        }
    }
}

impl fmt::Display for OpenGLInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self {
            version,
            renderer,
            vendor,
            shading_lang,
        } = self;
        writeln!(f, "OpenGL Version: {version}")?;
        writeln!(f, "Renderer: {renderer}")?;
        writeln!(f, "Vendor: {vendor}")?;
        writeln!(f, "Shading Language: {shading_lang}")?;
        Ok(())
    }
}
