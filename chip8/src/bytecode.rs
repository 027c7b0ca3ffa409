//! Helpers for extracting fields from opcodes.
//!
//! ```text
//! 0xDXYN
//!   ^      op_code
//!    ^^^   op_nnn
//!     ^^   op_nn
//!    ^     op_x
//!     ^    op_y
//!      ^   op_n
//! ```
use crate::constants::Address;

/// Extract the instruction family from the highest nibble.
#[inline(always)]
pub fn op_code(code: u16) -> u8 {
    (code >> 12) as u8
}

/// Extract operand NNN, a 12-bit address.
#[inline(always)]
pub fn op_nnn(code: u16) -> Address {
    code & 0x0FFF
}

/// Extract operand NN, the low byte.
#[inline(always)]
pub fn op_nn(code: u16) -> u8 {
    (code & 0x00FF) as u8
}

/// Extract register operand X.
#[inline(always)]
pub fn op_x(code: u16) -> u8 {
    ((code & 0x0F00) >> 8) as u8
}

/// Extract register operand Y.
#[inline(always)]
pub fn op_y(code: u16) -> u8 {
    ((code & 0x00F0) >> 4) as u8
}

/// Extract operand N, the lowest nibble.
#[inline(always)]
pub fn op_n(code: u16) -> u8 {
    (code & 0x000F) as u8
}
