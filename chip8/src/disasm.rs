//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{constants::*, op::Op};

pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    pub fn print_bytecode(&mut self) -> fmt::Result {
        let mut s = String::new();
        self.write_listing(&mut s)?;
        print!("{}", s);
        Ok(())
    }

    /// Write the whole program, one instruction per line.
    pub fn write_listing<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble(w)?;
            self.cursor += 2;
        }
        self.cursor = 0;
        Ok(())
    }

    /// Write a single instruction to the given writer.
    ///
    /// A trailing odd byte is printed as data.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let addr = MEM_START + self.cursor;

        match self.bytecode.get(self.cursor..self.cursor + 2) {
            Some(&[hi, lo]) => {
                let code = u16::from_be_bytes([hi, lo]);
                writeln!(w, "{:04X}: {:04X}  {}", addr, code, Op::decode(code))
            }
            _ => match self.bytecode.get(self.cursor) {
                Some(byte) => writeln!(w, "{:04X}: {:02X}    DB 0x{:02X}", addr, byte, byte),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_listing_addresses() {
        let mut dis = Disassembler::new(&[0x00, 0xE0, 0x12, 0x00]);
        let mut s = String::new();
        dis.write_listing(&mut s).unwrap();
        assert_eq!(s, "0200: 00E0  CLS\n0202: 1200  JP 0x200\n");
    }

    #[test]
    fn test_odd_length() {
        let mut dis = Disassembler::new(&[0x60, 0x01, 0xAB]);
        let mut s = String::new();
        dis.write_listing(&mut s).unwrap();
        assert_eq!(s.lines().nth(1), Some("0202: AB    DB 0xAB"));
    }
}
