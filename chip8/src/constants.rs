//! Constant values of the Chip-8 architecture.

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 0x10; // 16

/// Register used as a flag by arithmetic, shift and draw instructions.
pub const FLAG_REGISTER: usize = 0xF;

/// The lower memory space was historically used for the interpreter itself,
/// but is now used for fonts.
pub const MEM_START: usize = 0x200; // 512
pub const MEM_SIZE: usize = 0x1000; // 4096

/// All memory addressing is truncated to 12 bits.
pub const ADDRESS_MASK: usize = MEM_SIZE - 1;

/// Largest program that fits between `MEM_START` and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - MEM_START;

/// Levels of nesting allowed in the call stack.
pub const STACK_SIZE: usize = 0x10;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
/// Number of pixels on the display.
pub const DISPLAY_PIXEL_COUNT: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;
/// Size of the display buffer in bytes. Pixels are packed 8 per byte.
pub const DISPLAY_BUFFER_SIZE: usize = DISPLAY_PIXEL_COUNT / 8;

/// Colour written for an illuminated pixel when exporting the framebuffer.
pub const PIXEL_ON: u32 = 0xFFFF_FFFF;
pub const PIXEL_OFF: u32 = 0;

/// Font glyphs are loaded at the very start of memory.
pub const FONTSET_START: u16 = 0x000;
/// Height in bytes of a single font glyph.
pub const FONTSET_HEIGHT: usize = 5;
pub const FONTSET_DATA_LENGTH: usize = FONTSET_HEIGHT * 16;

/// Number of times per second the delay and sound timers count down.
pub const TIMER_FREQUENCY: u64 = 60;

/// Instructions executed per 60Hz frame, approximating a 540Hz CPU.
pub const DEFAULT_CYCLES_PER_FRAME: usize = 9;

/// Sample rate assumed for audio segments when the device doesn't say otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Number of nanoseconds in a second
#[doc(hidden)]
pub const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Time in nanoseconds a single timer tick takes, precalculated.
pub const TICK_TIME: u64 = NANOS_IN_SECOND / TIMER_FREQUENCY;

/// Number of keys ob the keyboard (0x0-0xF)
pub const KEY_COUNT: u8 = 16;

/// Type for storing the 12-bit memory addresses.
pub type Address = u16;
