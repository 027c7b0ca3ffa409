//! CPU and memory state.
use crate::{
    constants::*,
    devices::Keypad,
    display::Display,
    error::{Chip8Error, Chip8Result},
    memory::Memory,
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the next instruction to fetch.
    pub(crate) pc: Address,
    /// Number of return addresses on the stack. Zero is an empty stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Stored as 16 bits,
    /// but only the lowest 12 bits are used when addressing memory.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a tone is played.
    pub(crate) sound_timer: u8,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Memory,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Display,

    // ------------------------------------------------------------------------
    // Input
    /// Keyboard state and wait-for-key latch.
    pub(crate) keys: Keypad,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,

            ram: Memory::new(),
            stack: [0; STACK_SIZE],
            display: Display::new(),

            keys: Keypad::new(),
        }
    }
}

/// Result of counting down the timers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Number of 60Hz ticks that elapsed.
    pub ticks: u32,
    /// Number of those ticks in which the sound timer was still running.
    pub sound_ticks: u32,
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Put registers, timers, stack, input and display back into their power-on state.
    ///
    /// Memory is left untouched.
    pub(crate) fn reset(&mut self) {
        self.pc = MEM_START as Address;
        self.sp = 0;
        self.registers.fill(0);
        self.address = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack.fill(0);
        self.display.clear();
        self.keys.reset();
    }

    #[inline(always)]
    pub(crate) fn reg(&self, index: u8) -> u8 {
        self.registers[index as usize & 0xF]
    }

    #[inline(always)]
    pub(crate) fn set_reg(&mut self, index: u8, value: u8) {
        self.registers[index as usize & 0xF] = value;
    }

    #[inline(always)]
    pub(crate) fn set_flag(&mut self, value: u8) {
        self.registers[FLAG_REGISTER] = value;
    }

    /// Push a return address for a subroutine call.
    pub(crate) fn push_return(&mut self, addr: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow { pc: self.pc });
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop the return address of the current subroutine.
    pub(crate) fn pop_return(&mut self) -> Chip8Result<Address> {
        match self.sp.checked_sub(1) {
            Some(sp) => {
                self.sp = sp;
                Ok(self.stack[sp])
            }
            None => Err(Chip8Error::StackUnderflow { pc: self.pc }),
        }
    }

    /// Index of the top of the call stack, or `None` when it's empty.
    pub fn stack_pointer(&self) -> Option<usize> {
        self.sp.checked_sub(1)
    }

    /// Count down both timers by the given number of ticks, stopping at zero.
    pub(crate) fn tick_timers(&mut self, ticks: u32) -> TimerTick {
        let delay = ticks.min(self.delay_timer as u32);
        self.delay_timer -= delay as u8;

        let sound = ticks.min(self.sound_timer as u32);
        self.sound_timer -= sound as u8;

        TimerTick {
            ticks,
            sound_ticks: sound,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_power_on() {
        let cpu = Chip8Cpu::default();
        assert_eq!(cpu.pc, 0x200);
        assert_eq!(cpu.stack_pointer(), None);
    }

    #[test]
    fn test_stack() {
        let mut cpu = Chip8Cpu::default();

        for i in 0..STACK_SIZE {
            cpu.push_return(0x200 + i as Address * 2).unwrap();
            assert_eq!(cpu.stack_pointer(), Some(i));
        }
        assert!(matches!(
            cpu.push_return(0x300),
            Err(Chip8Error::StackOverflow { .. })
        ));

        for i in (0..STACK_SIZE).rev() {
            assert_eq!(cpu.pop_return().unwrap(), 0x200 + i as Address * 2);
        }
        assert_eq!(cpu.stack_pointer(), None);
        assert!(matches!(
            cpu.pop_return(),
            Err(Chip8Error::StackUnderflow { .. })
        ));
    }

    #[test]
    fn test_timers_saturate() {
        let mut cpu = Chip8Cpu::default();
        cpu.delay_timer = 10;
        cpu.sound_timer = 3;

        let tick = cpu.tick_timers(5);
        assert_eq!(cpu.delay_timer, 5);
        assert_eq!(cpu.sound_timer, 0);
        assert_eq!(tick, TimerTick { ticks: 5, sound_ticks: 3 });

        let tick = cpu.tick_timers(300);
        assert_eq!(cpu.delay_timer, 0);
        assert_eq!(tick.sound_ticks, 0);
    }

    #[test]
    fn test_register_index_masked() {
        let mut cpu = Chip8Cpu::default();
        cpu.set_reg(0x12, 7);
        assert_eq!(cpu.reg(0x2), 7);
    }
}
