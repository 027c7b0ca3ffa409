pub mod audio;
pub mod bytecode;
mod clock;
pub mod constants;
mod cpu;
pub mod devices;
mod disasm;
pub mod display;
mod error;
mod memory;
pub mod op;
mod vm;

pub use self::{
    devices::KeyCode,
    error::{Chip8Error, Chip8Result},
    vm::Hz,
};

/// Version of the interpreter, reported by the drivers.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        audio::{Segment, SegmentQueue, SquareWave},
        clock::{FrameClock, TickClock},
        cpu::{Chip8Cpu, TimerTick},
        devices::{KeyCode, Keypad},
        disasm::Disassembler,
        display::Display,
        error::{Chip8Error, Chip8Result},
        memory::{Memory, FONTSET},
        op::Op,
        vm::{Chip8Conf, Chip8Vm, Flow, FrameReport, Quirks},
    };
}
