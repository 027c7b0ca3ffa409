//! Virtual machine.
use std::{
    fmt::{self, Write},
    path::Path,
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    clock::TickClock,
    constants::*,
    cpu::{Chip8Cpu, TimerTick},
    devices::{KeyCode, Keypad},
    display::Display,
    error::Chip8Result,
    op::Op,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    clock: TickClock,
    rng: StdRng,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut vm = Chip8Vm {
            cpu: Chip8Cpu::new(),
            clock: TickClock::new(),
            rng,
            conf,
        };
        vm.load_builtin_font();

        vm
    }

    pub fn load_builtin_font(&mut self) {
        self.cpu.ram.load_builtin_font();
    }

    pub fn load_font(&mut self, fontset: &[u8]) -> Chip8Result<()> {
        self.cpu.ram.load_font(fontset)
    }

    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        // Start with clean memory to avoid leaking previous program.
        self.cpu.ram.clear();

        // Reset fonts
        self.load_builtin_font();

        // Load program into virtual RAM
        self.cpu.ram.load_program(bytecode)?;

        // Reset the program counter to prepare for execution.
        self.reset();

        log::debug!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    /// Read a ROM file from disk and load it as the program.
    pub fn load_rom(&mut self, filepath: impl AsRef<Path>) -> Chip8Result<()> {
        let filepath = filepath.as_ref();
        log::debug!("load rom: {}", filepath.display());

        let bytecode = std::fs::read(filepath)?;
        self.load_bytecode(&bytecode)
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset(&mut self) {
        self.cpu.reset();
        self.clock.reset();
    }

    pub fn display(&self) -> &Display {
        &self.cpu.display
    }

    pub fn keypad(&self) -> &Keypad {
        &self.cpu.keys
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    pub fn address(&self) -> Address {
        self.cpu.address
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    /// Index of the top of the call stack, or `None` when it's empty.
    pub fn stack_pointer(&self) -> Option<usize> {
        self.cpu.stack_pointer()
    }

    pub fn memory(&self) -> &[u8] {
        self.cpu.ram.as_slice()
    }

    /// Whether the machine is blocked on `Fx0A`, waiting for a key press.
    pub fn is_waiting(&self) -> bool {
        self.cpu.keys.waiting().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 0nnn (`SYS addr`)
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer was changed.
    Draw,
    /// The sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Chip8Conf {
    /// Number of instructions executed per 60Hz frame.
    pub cycles_per_frame: usize,
    pub quirks: Quirks,
    /// Seed for the `Cxnn` random number generator. Seeded from entropy when empty.
    pub rng_seed: Option<u64>,
}

impl Default for Chip8Conf {
    fn default() -> Self {
        Self {
            cycles_per_frame: DEFAULT_CYCLES_PER_FRAME,
            quirks: Quirks::default(),
            rng_seed: None,
        }
    }
}

/// Behaviour that differs between interpreters, which programs may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Quirks {
    /// `8xyE` stores the masked high bit (`0x80`) in VF, instead of 1.
    pub shift_left_raw_flag: bool,
    /// `8xy6` and `8xyE` copy VY into VX before shifting.
    pub shift_reads_vy: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            shift_left_raw_flag: true,
            shift_reads_vy: false,
        }
    }
}

/// Frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Outcome of one iteration of the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Control flow of the last executed cycle.
    pub flow: Flow,
    /// Timer ticks applied this frame.
    pub timers: TimerTick,
}

impl FrameReport {
    /// Whether a 60Hz boundary was crossed, and the display should be presented.
    pub fn ticked(&self) -> bool {
        self.timers.ticks > 0
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    ///
    /// If the VM is waiting for keyboard input, a key going down resolves
    /// the wait and its value is stored in the target register. Keys that
    /// are held down, or repeated, do not count.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        let rising = self.cpu.keys.set(key, pressed);

        if rising {
            if let Some(vx) = self.cpu.keys.resolve() {
                log::trace!("key wait resolved with {key} into v{vx:X}");
                self.cpu.set_reg(vx, key.as_u8());
            }
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.keys.clear()
    }

    /// Count down the timers according to the wall-clock time since the program started.
    pub fn update_timers(&mut self, elapsed: Duration) -> TimerTick {
        let ticks = self.clock.pending(elapsed);
        self.cpu.tick_timers(ticks)
    }

    /// One iteration of the driver loop.
    ///
    /// Runs the configured cycle budget, unless blocked on a key press,
    /// then brings the timers up to date with the elapsed time.
    pub fn run_frame(&mut self, elapsed: Duration) -> Chip8Result<FrameReport> {
        let flow = self.run_cycles(self.conf.cycles_per_frame)?;
        let timers = self.update_timers(elapsed);
        Ok(FrameReport { flow, timers })
    }

    /// Execute up to the given number of cycles.
    ///
    /// Stops early when the machine starts waiting for a key press.
    pub fn run_cycles(&mut self, cycle_count: usize) -> Chip8Result<Flow> {
        let mut flow = Flow::Ok;

        for _ in 0..cycle_count {
            flow = self.step()?;
            if flow == Flow::KeyWait {
                break;
            }
        }

        Ok(flow)
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Nothing is executed while waiting for a key press.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if self.is_waiting() {
            return Ok(Flow::KeyWait);
        }

        // Each instruction is two bytes, with the opcode identity in the first 4-bit nibble.
        let code = self.cpu.ram.fetch(self.cpu.pc);
        let op = Op::decode(code);

        op_trace(self.cpu.pc, &op);

        // Advance before execution, so jumps can overwrite it.
        self.cpu.pc = self.cpu.pc.wrapping_add(2);

        self.execute(op)
    }

    /// Execute a decoded instruction against the current machine state.
    ///
    /// The program counter is expected to already point past the instruction.
    pub fn execute(&mut self, op: Op) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match op {
            // 00E0 (CLS)
            //
            // Clear display
            Op::ClearScreen => {
                self.cpu.display.clear();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            Op::Return => {
                self.cpu.pc = self.cpu.pop_return()?;
                control_flow = Flow::Jump;
            }
            // 0nnn (SYS addr)
            // 1nnn (JP addr)
            //
            // Jump to address.
            Op::Sys { address } | Op::JumpAddress { address } => {
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 2nnn (CALL addr)
            //
            // Call subroutine at nnn.
            Op::Call { address } => {
                self.cpu.push_return(self.cpu.pc)?;
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 3xnn (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => {
                if self.cpu.reg(vx) == nn {
                    self.skip();
                }
            }
            // 4xnn (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => {
                if self.cpu.reg(vx) != nn {
                    self.skip();
                }
            }
            // 5xy0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => {
                if self.cpu.reg(vx) == self.cpu.reg(vy) {
                    self.skip();
                }
            }
            // 6xnn (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                self.cpu.set_reg(vx, nn);
            }
            // 7xnn (ADD Vx, byte)
            //
            // Carry flag is not set.
            Op::Add_Byte { vx, nn } => {
                let x = self.cpu.reg(vx);
                self.cpu.set_reg(vx, x.wrapping_add(nn));
            }
            // 9xy0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => {
                if self.cpu.reg(vx) != self.cpu.reg(vy) {
                    self.skip();
                }
            }
            // Annn (LD I, addr)
            Op::Load_Address { address } => {
                self.cpu.address = address;
            }
            // Bnnn (JP V0, addr)
            Op::Jump_V0 { address } => {
                self.cpu.pc = address.wrapping_add(self.cpu.reg(0) as Address);
                control_flow = Flow::Jump;
            }
            // Cxnn (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            Op::Random { vx, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                self.cpu.set_reg(vx, value);
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            Op::Draw { vx, vy, n } => {
                let (x, y) = (self.cpu.reg(vx), self.cpu.reg(vy));
                let mut is_erased = false;

                for r in 0..n {
                    let sprite = self.cpu.ram.read(self.cpu.address.wrapping_add(r as Address));
                    is_erased |= self.cpu.display.draw_row(x, y.wrapping_add(r), sprite);
                }

                self.cpu.set_flag(is_erased as u8);
                control_flow = Flow::Draw;
            }
            Op::Load_Vx_Vy { .. }
            | Op::Or_Vx_Vy { .. }
            | Op::And_Vx_Vy { .. }
            | Op::Xor_Vx_Vy { .. }
            | Op::Add_Vx_Vy { .. }
            | Op::Sub_Vx_Vy { .. }
            | Op::ShiftRight { .. }
            | Op::SubReverse_Vx_Vy { .. }
            | Op::ShiftLeft { .. } => self.exec_math(op),
            Op::Unknown { code } => {
                log::trace!("ignoring unknown instruction 0x{code:04X}");
            }
            _ => control_flow = self.exec_misc(op),
        }

        Ok(control_flow)
    }

    #[inline(always)]
    fn skip(&mut self) {
        self.cpu.pc = self.cpu.pc.wrapping_add(2);
    }

    /// Execute an arithmetic instruction
    ///
    /// VF is always written before the result, so when VX is VF the
    /// result wins.
    #[inline]
    fn exec_math(&mut self, op: Op) {
        let quirks = self.conf.quirks;

        match op {
            // 8xy0 (LD Vx, Vy)
            Op::Load_Vx_Vy { vx, vy } => {
                self.cpu.set_reg(vx, self.cpu.reg(vy));
            }
            // 8xy1 (OR Vx, Vy)
            Op::Or_Vx_Vy { vx, vy } => {
                self.cpu.set_reg(vx, self.cpu.reg(vx) | self.cpu.reg(vy));
            }
            // 8xy2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => {
                self.cpu.set_reg(vx, self.cpu.reg(vx) & self.cpu.reg(vy));
            }
            // 8xy3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => {
                self.cpu.set_reg(vx, self.cpu.reg(vx) ^ self.cpu.reg(vy));
            }
            // 8xy4 (ADD Vx, Vy)
            //
            // Overflow is wrapped.
            // If overflow, set VF to 1, else 0.
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = self.cpu.reg(vx).overflowing_add(self.cpu.reg(vy));
                self.cpu.set_flag(carry as u8);
                self.cpu.set_reg(vx, result);
            }
            // 8xy5 (SUB Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub_Vx_Vy { vx, vy } => {
                let (result, borrow) = self.cpu.reg(vx).overflowing_sub(self.cpu.reg(vy));
                self.cpu.set_flag(!borrow as u8);
                self.cpu.set_reg(vx, result);
            }
            // 8xy7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (result, borrow) = self.cpu.reg(vy).overflowing_sub(self.cpu.reg(vx));
                self.cpu.set_flag(!borrow as u8);
                self.cpu.set_reg(vx, result);
            }
            // 8xy6 (SHR Vx)
            //
            // If the least-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
            // Shift VX right by 1.
            Op::ShiftRight { vx, vy } => {
                if quirks.shift_reads_vy {
                    self.cpu.set_reg(vx, self.cpu.reg(vy));
                }
                self.cpu.set_flag(self.cpu.reg(vx) & 0x01);
                self.cpu.set_reg(vx, self.cpu.reg(vx) >> 1);
            }
            // 8xyE (SHL Vx)
            //
            // VF receives the most-significant bit of Vx.
            // Shift VX left by 1.
            Op::ShiftLeft { vx, vy } => {
                if quirks.shift_reads_vy {
                    self.cpu.set_reg(vx, self.cpu.reg(vy));
                }
                let high = self.cpu.reg(vx) & 0x80;
                if quirks.shift_left_raw_flag {
                    self.cpu.set_flag(high);
                } else {
                    self.cpu.set_flag(high >> 7);
                }
                self.cpu.set_reg(vx, self.cpu.reg(vx) << 1);
            }
            _ => unreachable!("not an arithmetic instruction: {op:?}"),
        }
    }

    /// Execute a keyboard, timer or memory instruction
    #[inline]
    #[must_use]
    fn exec_misc(&mut self, op: Op) -> Flow {
        let mut control_flow = Flow::Ok;

        match op {
            // ----------------------------------------------------------------
            // Ex9E (SKP Vx)
            Op::Skip_Key { vx } => {
                if self.cpu.keys.is_pressed(self.cpu.reg(vx)) {
                    self.skip();
                }
            }
            // ExA1 (SKNP Vx)
            Op::Skip_NotKey { vx } => {
                if !self.cpu.keys.is_pressed(self.cpu.reg(vx)) {
                    self.skip();
                }
            }
            // ----------------------------------------------------------------
            // Fx07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            Op::Load_Vx_Delay { vx } => {
                self.cpu.set_reg(vx, self.cpu.delay_timer);
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // All execution stops until a key goes down.
            Op::Wait_Key { vx } => {
                self.cpu.keys.begin_wait(vx);
                control_flow = Flow::KeyWait;
            }
            // Fx15 (LD DT, Vx)
            Op::Load_Delay_Vx { vx } => {
                self.cpu.delay_timer = self.cpu.reg(vx);
            }
            // Fx18 (LD ST, Vx)
            Op::Load_Sound_Vx { vx } => {
                self.cpu.sound_timer = self.cpu.reg(vx);
                control_flow = Flow::Sound;
            }
            // Fx1E (ADD I, Vx)
            //
            // I is treated as a 12-bit register, and VF flags the overflow.
            Op::Add_Address_Vx { vx } => {
                let sum = (self.cpu.address & ADDRESS_MASK as Address) + self.cpu.reg(vx) as Address;
                self.cpu.set_flag((sum >> 12) as u8);
                self.cpu.address = sum;
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Op::Load_Font { vx } => {
                let x = self.cpu.reg(vx) as Address;
                self.cpu.address = FONTSET_START + x * FONTSET_HEIGHT as Address;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::Store_Bcd { vx } => {
                let addr = self.cpu.address;
                let x = self.cpu.reg(vx);
                self.cpu.ram.write(addr,                  x / 100);
                self.cpu.ram.write(addr.wrapping_add(1), x / 10 % 10);
                self.cpu.ram.write(addr.wrapping_add(2), x % 10);
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            // I is left pointing after the last stored register.
            Op::Store_Registers { vx } => {
                for v in 0..=vx {
                    self.cpu.ram.write(self.cpu.address, self.cpu.reg(v));
                    self.cpu.address = self.cpu.address.wrapping_add(1);
                }
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            // I is left pointing after the last loaded register.
            Op::Load_Registers { vx } => {
                for v in 0..=vx {
                    let value = self.cpu.ram.read(self.cpu.address);
                    self.cpu.set_reg(v, value);
                    self.cpu.address = self.cpu.address.wrapping_add(1);
                }
            }
            _ => unreachable!("not a miscellaneous instruction: {op:?}"),
        }

        control_flow
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let ram = self.cpu.ram.as_slice();
        let iter = ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            let next = ram[(i + 1) & ADDRESS_MASK];
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, next)?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        self.cpu.display.dump()
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.keys.any() {
            write!(buf, "keys: ")?;
            for i in self.cpu.keys.pressed() {
                write!(buf, "k{i:x}")?;
            }
        }

        Ok(buf)
    }

    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        write!(buf, "PC={:04X} I={:04X} SP=", self.cpu.pc, self.cpu.address)?;
        match self.stack_pointer() {
            Some(sp) => write!(buf, "{sp}")?,
            None => write!(buf, "-")?,
        }
        for (i, v) in self.cpu.registers.iter().enumerate() {
            write!(buf, " v{i:X}={v:02X}")?;
        }
        write!(
            buf,
            " DT={} ST={}",
            self.cpu.delay_timer, self.cpu.sound_timer
        )?;

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: Address, op: &Op) {
    log::trace!("{pc:04X}: {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: &Op) {}
