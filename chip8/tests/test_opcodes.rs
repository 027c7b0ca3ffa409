use std::time::Duration;

use chip8::{constants::*, prelude::*};

fn load(bytecode: &[u8]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf {
        rng_seed: Some(42),
        ..Chip8Conf::default()
    });
    vm.load_bytecode(bytecode).unwrap();
    vm
}

fn run(bytecode: &[u8], steps: usize) -> Chip8Vm {
    let mut vm = load(bytecode);
    for _ in 0..steps {
        vm.step().unwrap();
    }
    vm
}

#[test]
#[rustfmt::skip]
fn test_pc_stays_even() {
    let mut vm = load(&[
        0x60, 0x05, // LD v0, 5
        0x30, 0x05, // SE v0, 5
        0x00, 0x00, // skipped
        0x40, 0x05, // SNE v0, 5
        0x71, 0x01, // ADD v1, 1
        0x82, 0x14, // ADD v2, v1
        0xA3, 0x00, // LD I, 0x300
        0xC3, 0xFF, // RND v3, 0xFF
    ]);

    for _ in 0..7 {
        vm.step().unwrap();
        assert_eq!(vm.pc() % 2, 0);
    }
    assert_eq!(vm.pc(), 0x210);
}

#[test]
#[rustfmt::skip]
fn test_clear_screen() {
    let mut vm = load(&[
        0x60, 0x00, // LD v0, 0
        0xF0, 0x29, // LD F, v0
        0xD0, 0x05, // DRW v0, v0, 5
        0x00, 0xE0, // CLS
    ]);

    vm.run_cycles(3).unwrap();
    assert!(vm.display().as_bytes().iter().any(|b| *b != 0));

    assert_eq!(vm.step().unwrap(), Flow::Draw);
    assert!(vm.display().as_bytes().iter().all(|b| *b == 0));
}

#[test]
fn test_load_byte() {
    let mut bytecode = vec![];
    for x in 0..16_u8 {
        bytecode.push(0x60 | x);
        bytecode.push(0x11 * x);
    }

    let vm = run(&bytecode, 16);
    for x in 0..16 {
        assert_eq!(vm.registers()[x], 0x11 * x as u8);
    }
}

#[test]
fn test_add_carry() {
    let vm = run(&[0x60, 0xFF, 0x61, 0x01, 0x80, 0x14], 3);
    assert_eq!(vm.registers()[0], 0x00);
    assert_eq!(vm.registers()[0xF], 1);

    let vm = run(&[0x60, 0x01, 0x61, 0x01, 0x80, 0x14], 3);
    assert_eq!(vm.registers()[0], 0x02);
    assert_eq!(vm.registers()[0xF], 0);
}

/// The flag is written first, so the sum wins when VF is the target.
#[test]
fn test_add_into_flag_register() {
    let vm = run(&[0x6F, 0xFF, 0x61, 0x01, 0x8F, 0x14], 3);
    assert_eq!(vm.registers()[0xF], 0x00);

    let vm = run(&[0x6F, 0x01, 0x61, 0x01, 0x8F, 0x14], 3);
    assert_eq!(vm.registers()[0xF], 0x02);
}

#[test]
fn test_sub_borrow() {
    let vm = run(&[0x60, 0x05, 0x61, 0x0A, 0x80, 0x15], 3);
    assert_eq!(vm.registers()[0], 0xFB);
    assert_eq!(vm.registers()[0xF], 0);

    let vm = run(&[0x60, 0x0A, 0x61, 0x05, 0x80, 0x15], 3);
    assert_eq!(vm.registers()[0], 0x05);
    assert_eq!(vm.registers()[0xF], 1);
}

#[test]
fn test_sub_reverse_borrow() {
    let vm = run(&[0x60, 0x0A, 0x61, 0x05, 0x80, 0x17], 3);
    assert_eq!(vm.registers()[0], 0xFB);
    assert_eq!(vm.registers()[0xF], 0);

    let vm = run(&[0x60, 0x05, 0x61, 0x0A, 0x80, 0x17], 3);
    assert_eq!(vm.registers()[0], 0x05);
    assert_eq!(vm.registers()[0xF], 1);
}

#[test]
fn test_bitwise() {
    let vm = run(
        &[
            0x60, 0b1100, 0x61, 0b1010, 0x82, 0x00, 0x82, 0x11, 0x83, 0x00, 0x83, 0x12, 0x84,
            0x00, 0x84, 0x13,
        ],
        8,
    );
    assert_eq!(vm.registers()[2], 0b1110);
    assert_eq!(vm.registers()[3], 0b1000);
    assert_eq!(vm.registers()[4], 0b0110);
}

#[test]
fn test_shift_right() {
    let vm = run(&[0x60, 0x05, 0x80, 0x06], 2);
    assert_eq!(vm.registers()[0], 0x02);
    assert_eq!(vm.registers()[0xF], 1);
}

#[test]
#[rustfmt::skip]
fn test_draw_wraps_horizontally() {
    let vm = run(&[
        0x60, 0x3C, // LD v0, 60
        0x61, 0x00, // LD v1, 0
        0xA2, 0x08, // LD I, sprite
        0xD0, 0x11, // DRW v0, v1, 1
        0xFF,       // sprite
    ], 4);

    for x in 0..DISPLAY_WIDTH {
        let expected = x < 4 || x >= 60;
        assert_eq!(vm.display().is_set(x, 0), expected, "column {x}");
    }
    assert!(!vm.display().is_set(0, 1));
    assert_eq!(vm.registers()[0xF], 0);
}

#[test]
#[rustfmt::skip]
fn test_draw_wraps_vertically() {
    let vm = run(&[
        0x60, 0x00, // LD v0, 0
        0x61, 0x1F, // LD v1, 31
        0xA2, 0x08, // LD I, sprite
        0xD0, 0x12, // DRW v0, v1, 2
        0x80, 0x80, // sprite
    ], 4);

    assert!(vm.display().is_set(0, 31));
    assert!(vm.display().is_set(0, 0));
}

#[test]
#[rustfmt::skip]
fn test_draw_sprite_wraps_address() {
    let vm = run(&[
        0x60, 0xAA, // LD v0, 0xAA
        0xAF, 0xFF, // LD I, 0xFFF
        0xF0, 0x55, // LD [I], v0
        0xAF, 0xFF, // LD I, 0xFFF
        0x60, 0x00, // LD v0, 0
        0xD0, 0x02, // DRW v0, v0, 2
    ], 6);

    // Row 0 from 0xFFF, row 1 from the first font byte at 0x000.
    for x in 0..8 {
        assert_eq!(vm.display().is_set(x, 0), 0xAA & (0x80 >> x) != 0, "row 0 column {x}");
        assert_eq!(vm.display().is_set(x, 1), FONTSET[0] & (0x80 >> x) != 0, "row 1 column {x}");
    }
}

#[test]
#[rustfmt::skip]
fn test_draw_twice_erases() {
    let mut vm = load(&[
        0x60, 0x10, // LD v0, 16
        0x61, 0x08, // LD v1, 8
        0xA2, 0x0C, // LD I, sprite
        0xD0, 0x11, // DRW v0, v1, 1
        0xD0, 0x11, // DRW v0, v1, 1
        0x12, 0x0A, // JP 0x20A
        0xFF,       // sprite
    ]);

    vm.run_cycles(4).unwrap();
    assert_eq!(vm.registers()[0xF], 0);
    assert!(vm.display().is_set(16, 8));

    vm.step().unwrap();
    assert_eq!(vm.registers()[0xF], 1);
    assert!(vm.display().as_bytes().iter().all(|b| *b == 0));
}

#[test]
#[rustfmt::skip]
fn test_wait_key_halts() {
    let mut vm = load(&[
        0xF4, 0x0A, // LD v4, K
        0x65, 0x01, // LD v5, 1
    ]);

    assert_eq!(vm.step().unwrap(), Flow::KeyWait);
    let pc = vm.pc();
    for i in 1..10 {
        let report = vm.run_frame(Duration::from_millis(i * 20)).unwrap();
        assert_eq!(report.flow, Flow::KeyWait);
        assert_eq!(vm.pc(), pc);
    }
    assert_eq!(vm.registers()[5], 0);

    vm.set_key(KeyCode::KeyA, true);
    assert_eq!(vm.registers()[4], 0xA);

    vm.step().unwrap();
    assert_eq!(vm.pc(), pc + 2);
    assert_eq!(vm.registers()[5], 1);
}

#[test]
fn test_skip_key() {
    let mut vm = load(&[0x60, 0x05, 0xE0, 0x9E]);
    vm.set_key(KeyCode::Key5, true);
    vm.run_cycles(2).unwrap();
    assert_eq!(vm.pc(), 0x206);

    let mut vm = load(&[0x60, 0x05, 0xE0, 0xA1]);
    vm.set_key(KeyCode::Key5, true);
    vm.run_cycles(2).unwrap();
    assert_eq!(vm.pc(), 0x204);

    vm.clear_keys();
    assert!(!vm.keypad().any());
}

/// Key ids beyond the keypad are never pressed.
#[test]
fn test_skip_key_out_of_range() {
    let mut vm = load(&[0x60, 0x20, 0xE0, 0x9E]);
    vm.set_key(KeyCode::Key0, true);
    vm.run_cycles(2).unwrap();
    assert_eq!(vm.pc(), 0x204);

    let vm = run(&[0x60, 0x20, 0xE0, 0xA1], 2);
    assert_eq!(vm.pc(), 0x206);
}

#[test]
fn test_delay_timer_half_second() {
    let mut vm = load(&[0x60, 0x3C, 0xF0, 0x15, 0xF1, 0x07]);
    vm.run_cycles(2).unwrap();
    assert_eq!(vm.delay_timer(), 60);

    let tick = vm.update_timers(Duration::from_millis(500));
    assert_eq!(tick.ticks, 30);
    assert_eq!(vm.delay_timer(), 30);

    vm.step().unwrap();
    assert_eq!(vm.registers()[1], 30);
}

#[test]
fn test_sound_timer_ticks() {
    let mut vm = load(&[0x60, 0x02, 0xF0, 0x18, 0x12, 0x04]);
    vm.step().unwrap();
    assert_eq!(vm.step().unwrap(), Flow::Sound);
    assert_eq!(vm.sound_timer(), 2);

    let tick = vm.update_timers(Duration::from_millis(100));
    assert_eq!(tick.ticks, 6);
    assert_eq!(tick.sound_ticks, 2);
    assert_eq!(vm.sound_timer(), 0);
}

#[test]
#[rustfmt::skip]
fn test_store_load_registers() {
    let mut vm = load(&[
        0x60, 0x01, // LD v0, 1
        0x61, 0x02, // LD v1, 2
        0x62, 0x03, // LD v2, 3
        0x63, 0x04, // LD v3, 4
        0xA3, 0x00, // LD I, 0x300
        0xF3, 0x55, // LD [I], v3
        0x60, 0x00, // LD v0, 0
        0x61, 0x00, // LD v1, 0
        0x62, 0x00, // LD v2, 0
        0x63, 0x00, // LD v3, 0
        0xA3, 0x00, // LD I, 0x300
        0xF3, 0x65, // LD v3, [I]
    ]);

    vm.run_cycles(6).unwrap();
    assert_eq!(&vm.memory()[0x300..0x305], &[1, 2, 3, 4, 0]);
    assert_eq!(vm.address(), 0x304);

    vm.run_cycles(6).unwrap();
    assert_eq!(&vm.registers()[..5], &[1, 2, 3, 4, 0]);
    assert_eq!(vm.address(), 0x304);
}

#[test]
#[rustfmt::skip]
fn test_store_load_registers_wrap_address() {
    let mut vm = load(&[
        0x60, 0x01, // LD v0, 1
        0x61, 0x02, // LD v1, 2
        0x62, 0x03, // LD v2, 3
        0x63, 0x04, // LD v3, 4
        0xAF, 0xFE, // LD I, 0xFFE
        0xF3, 0x55, // LD [I], v3
        0x6F, 0x00, // LD vF, 0
        0x60, 0x00, // LD v0, 0
        0x63, 0x00, // LD v3, 0
        0xAF, 0xFE, // LD I, 0xFFE
        0xF3, 0x65, // LD v3, [I]
    ]);

    vm.run_cycles(6).unwrap();
    assert_eq!(&vm.memory()[0xFFE..], &[1, 2]);
    assert_eq!(&vm.memory()[..2], &[3, 4]);

    vm.run_cycles(5).unwrap();
    assert_eq!(&vm.registers()[..4], &[1, 2, 3, 4]);
}

#[test]
fn test_bcd() {
    let vm = run(&[0x60, 0xFE, 0xA3, 0x00, 0xF0, 0x33], 3);
    assert_eq!(&vm.memory()[0x300..0x303], &[2, 5, 4]);
    assert_eq!(vm.address(), 0x300);
}

#[test]
fn test_add_address_overflow() {
    let vm = run(&[0xAF, 0xFF, 0x60, 0x01, 0xF0, 0x1E], 3);
    assert_eq!(vm.address(), 0x1000);
    assert_eq!(vm.registers()[0xF], 1);

    let vm = run(&[0xA1, 0x00, 0x60, 0x05, 0xF0, 0x1E], 3);
    assert_eq!(vm.address(), 0x105);
    assert_eq!(vm.registers()[0xF], 0);
}

#[test]
fn test_font_address() {
    let vm = run(&[0x60, 0x0A, 0xF0, 0x29], 2);
    assert_eq!(vm.address(), 50);
    assert_eq!(&vm.memory()[50..55], &FONTSET[50..55]);
}

#[test]
#[rustfmt::skip]
fn test_call_return() {
    let mut vm = load(&[
        0x22, 0x06, // CALL 0x206
        0x60, 0x42, // LD v0, 0x42
        0x12, 0x04, // JP 0x204
        0x61, 0x07, // LD v1, 7
        0x00, 0xEE, // RET
    ]);

    assert_eq!(vm.step().unwrap(), Flow::Jump);
    assert_eq!(vm.pc(), 0x206);
    assert_eq!(vm.stack_pointer(), Some(0));

    vm.step().unwrap();
    assert_eq!(vm.step().unwrap(), Flow::Jump);
    assert_eq!(vm.pc(), 0x202);
    assert_eq!(vm.stack_pointer(), None);

    vm.step().unwrap();
    assert_eq!(vm.registers()[0], 0x42);
    assert_eq!(vm.registers()[1], 7);
}

#[test]
fn test_stack_overflow() {
    // CALL 0x200, forever
    let mut vm = load(&[0x22, 0x00]);
    for _ in 0..STACK_SIZE {
        vm.step().unwrap();
    }

    match vm.step() {
        Err(err @ Chip8Error::StackOverflow { .. }) => assert!(err.is_runtime()),
        other => panic!("expected stack overflow, got {other:?}"),
    }
}

#[test]
fn test_stack_underflow() {
    let mut vm = load(&[0x00, 0xEE]);
    assert!(matches!(
        vm.step(),
        Err(Chip8Error::StackUnderflow { .. })
    ));
}

#[test]
fn test_sys_is_jump() {
    let mut vm = load(&[0x00, 0x00]);
    assert_eq!(vm.step().unwrap(), Flow::Jump);
    assert_eq!(vm.pc(), 0x000);

    let mut vm = load(&[0x03, 0x21]);
    vm.step().unwrap();
    assert_eq!(vm.pc(), 0x321);
}

#[test]
fn test_jump_v0() {
    let vm = run(&[0x60, 0x04, 0xB3, 0x00], 2);
    assert_eq!(vm.pc(), 0x304);
}

#[test]
fn test_skip_register_ignores_low_nibble() {
    let vm = run(&[0x60, 0x01, 0x61, 0x01, 0x50, 0x1F], 3);
    assert_eq!(vm.pc(), 0x208);

    let vm = run(&[0x60, 0x01, 0x61, 0x02, 0x90, 0x1F], 3);
    assert_eq!(vm.pc(), 0x208);
}

#[test]
#[rustfmt::skip]
fn test_skip_key_selected_by_low_nibble() {
    let mut vm = load(&[
        0x60, 0x05, // LD v0, 5
        0xE0, 0x0E, // SKP v0
    ]);
    vm.set_key(KeyCode::Key5, true);
    vm.run_cycles(2).unwrap();
    assert_eq!(vm.pc(), 0x206);

    let vm = run(&[
        0x60, 0x05, // LD v0, 5
        0xE0, 0x01, // SKNP v0
    ], 2);
    assert_eq!(vm.pc(), 0x206);
}

#[test]
fn test_unknown_is_noop() {
    let vm = run(&[0x60, 0x09, 0x80, 0x08, 0xE0, 0x00, 0xF0, 0xFF], 4);
    assert_eq!(vm.pc(), 0x208);
    assert_eq!(vm.registers()[0], 0x09);
    assert_eq!(vm.registers()[0xF], 0);
}

#[test]
fn test_execute_decoded() {
    let mut vm = load(&[]);
    vm.execute(Op::Load_Byte { vx: 3, nn: 0x33 }).unwrap();
    vm.execute(Op::Add_Byte { vx: 3, nn: 0xFF }).unwrap();
    assert_eq!(vm.registers()[3], 0x32);
    assert_eq!(vm.registers()[0xF], 0);
}

#[test]
fn test_program_size() {
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    assert!(vm.load_bytecode(&vec![0; MAX_PROGRAM_SIZE]).is_ok());
    assert!(matches!(
        vm.load_bytecode(&vec![0; MAX_PROGRAM_SIZE + 1]),
        Err(Chip8Error::LargeProgram)
    ));
}

#[test]
fn test_missing_rom() {
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    assert!(matches!(
        vm.load_rom("programs/does-not-exist"),
        Err(Chip8Error::Io(_))
    ));
}

#[test]
fn test_reload_resets_state() {
    let mut vm = run(&[0x60, 0x0A, 0xA3, 0x00, 0xF0, 0x15], 3);
    vm.load_bytecode(&[0x12, 0x00]).unwrap();

    assert_eq!(vm.pc(), MEM_START as Address);
    assert_eq!(vm.address(), 0);
    assert_eq!(vm.delay_timer(), 0);
    assert!(vm.registers().iter().all(|v| *v == 0));
    assert_eq!(&vm.memory()[0x202..0x206], &[0, 0, 0, 0]);
}
