//! Entrypoint for CLI
use std::{env, error::Error, fs, process};

use chip8::{prelude::*, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: chip8 CMD FILE [FRAMES]

commands:
    run     Run the target ROM file headless, and print the display
    dis     Disassemble the the target ROM into readable assembly

examples:
    chip8 run breakout.rom
    chip8 run maze.rom 120
    chip8 dis breakout.rom
"#;

/// Ten seconds of emulated time.
const DEFAULT_FRAMES: u64 = 600;

fn run_bytecode(filepath: &str, frames: u64) -> Chip8Result<()> {
    info!("running {filepath} for {frames} frames");

    let mut vm = Chip8Vm::new(Chip8Conf::default());
    vm.load_rom(filepath)?;

    let mut clock = FrameClock::new();
    let mut result = Ok(());

    for _ in 0..frames {
        match vm.run_frame(clock.elapsed()) {
            Ok(report) => {
                if report.flow == Flow::KeyWait {
                    // Nobody is going to press a key.
                    info!("program is waiting for a key press, stopping");
                    break;
                }
            }
            Err(err) => {
                result = Err(err);
                break;
            }
        }
        clock.wait();
    }

    println!("{}", vm.dump_display()?);
    println!("{}", vm.dump_registers()?);

    result
}

fn run_disassembler(filepath: &str) -> Chip8Result<()> {
    let bytecode = fs::read(filepath)?;
    Disassembler::new(bytecode.as_slice()).print_bytecode()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let result = match parse_args() {
        Some(Cmd::Run { filepath, frames }) => run_bytecode(&filepath, frames),
        Some(Cmd::Dis { filepath }) => run_disassembler(&filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    if let Err(err) = result {
        error!("{err}");
        eprintln!("{err}");
        process::exit(1);
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => {
            // don't format me T.T
            match cmd.as_str() {
                "run" => Some(Cmd::Run {
                    filepath: args.next()?,
                    frames: match args.next() {
                        Some(frames) => frames.parse().ok()?,
                        None => DEFAULT_FRAMES,
                    },
                }),
                "dis" => Some(Cmd::Dis {
                    filepath: args.next()?,
                }),
                _ => None,
            }
        }
        None => None,
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run { filepath: String, frames: u64 },
    /// Disassemble
    Dis { filepath: String },
}
