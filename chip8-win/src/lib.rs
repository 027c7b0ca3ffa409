mod app;
mod audio;
mod error;
mod inputmap;
mod render;
mod window;

pub use self::{
    app::Chip8App,
    audio::AudioOutput,
    error::{AppError, ErrorKind},
    inputmap::{InputKind, InputMap},
};

pub type EventLoop = winit::event_loop::EventLoop<()>;

/// Named application actions, bound in the key map.
pub mod actions {
    /// Close the window and stop the interpreter.
    pub const EXIT: &str = "exit";
}
