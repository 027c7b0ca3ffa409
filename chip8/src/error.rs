//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

use crate::constants::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Subroutine call with all 16 stack entries in use.
    StackOverflow { pc: Address },
    /// Return instruction with an empty call stack.
    StackUnderflow { pc: Address },
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram,
    /// Font data has the wrong shape.
    Font(String),
    Io(io::Error),
    Fmt(fmt::Error),
}

impl Chip8Error {
    /// Whether the error was raised by the interpreter loop, rather than while loading.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::StackOverflow { .. } | Self::StackUnderflow { .. })
    }
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow { pc } => {
                write!(f, "runtime error: call stack overflow at 0x{pc:03X}")
            }
            Self::StackUnderflow { pc } => {
                write!(f, "runtime error: call stack underflow at 0x{pc:03X}")
            }
            Self::LargeProgram => write!(f, "program too large for VM memory"),
            Self::Font(msg) => write!(f, "font error: {msg}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Fmt(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

impl From<io::Error> for Chip8Error {
    fn from(err: io::Error) -> Self {
        Chip8Error::Io(err)
    }
}
