use std::time::Duration;

use chip8::{constants::*, prelude::*};

const MAZE: &[u8] = include_bytes!("../programs/maze");

#[test]
fn test_maze_fills_screen() {
    let mut vm = Chip8Vm::new(Chip8Conf {
        rng_seed: Some(1),
        ..Chip8Conf::default()
    });
    vm.load_bytecode(MAZE).unwrap();

    for frame in 1..=200 {
        let report = vm
            .run_frame(Duration::from_micros(frame * 16_667))
            .unwrap();
        assert_eq!(report.timers.ticks, 1);
    }

    // Finished, spinning on the last jump.
    assert_eq!(vm.pc(), 0x218);

    // 128 diagonal tiles of four pixels, none overlapping.
    let lit = vm
        .display()
        .to_pixels(PIXEL_ON)
        .into_iter()
        .filter(|p| *p == PIXEL_ON)
        .count();
    assert_eq!(lit, 512);
    assert_eq!(vm.registers()[0xF], 0);

    let dump = vm.dump_display().unwrap();
    assert_eq!(dump.lines().count(), DISPLAY_HEIGHT);
    assert!(dump.lines().all(|line| line.len() == DISPLAY_WIDTH));
}

#[test]
fn test_maze_disassembly() {
    let mut disasm = Disassembler::new(MAZE);

    let mut buf = String::new();
    disasm.write_listing(&mut buf).unwrap();

    let lines: Vec<&str> = buf.lines().collect();
    assert_eq!(lines.len(), MAZE.len() / 2);
    assert_eq!(lines[0], "0200: A21E  LD I, 0x21E");
    assert_eq!(lines[1], "0202: C201  RND v2, 1");
    assert_eq!(lines[4], "0208: D014  DRW v0, v1, 4");
    assert_eq!(lines[7], "020E: 1200  JP 0x200");
    assert_eq!(lines[9], "0212: 7104  ADD v1, 4");
    assert_eq!(lines[12], "0218: 1218  JP 0x218");
}

#[test]
fn test_frame_audio_segments() {
    // LD v0, 30; LD ST, v0; JP 0x204
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    vm.load_bytecode(&[0x60, 0x1E, 0xF0, 0x18, 0x12, 0x04])
        .unwrap();

    let queue = SegmentQueue::default();
    let report = vm.run_frame(Duration::from_secs(1)).unwrap();
    queue.push_tick(DEFAULT_SAMPLE_RATE, report.timers);

    assert_eq!(report.timers.ticks, 60);
    assert_eq!(report.timers.sound_ticks, 30);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.front(), Some(Segment::on(22_050)));
    assert_eq!(queue.queued_samples(), DEFAULT_SAMPLE_RATE as u64);
}
