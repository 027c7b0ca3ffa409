use std::{env, error::Error, process};

#[macro_use]
extern crate slog;
use chip8::{prelude::Chip8Conf, IMPL_VERSION};
use chip8_win::{AppError, Chip8App, InputMap};
use log::{error, info};
use slog::Drain;

static USAGE: &str = r#"
usage: chip8-win ROM [--keymap FILE] [--config FILE]

options:
    --keymap FILE   YAML key map, replacing the built-in QWERTY layout
    --config FILE   YAML interpreter configuration

examples:
    chip8-win breakout.rom
    chip8-win breakout.rom --config quirks.yaml
"#;

struct Args {
    rom: String,
    keymap: Option<String>,
    config: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let decorator = slog_term::PlainDecorator::new(std::io::stdout());
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let logger = slog::Logger::root(drain, o!("version" => IMPL_VERSION));

    let _scope_guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(log::Level::Debug)?;

    let args = match parse_args() {
        Some(args) => args,
        None => {
            println!("{USAGE}");
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    info!("starting...");

    match run(args) {
        Ok(_) => {}
        Err(err) => {
            error!("{err}");
            eprintln!("{err}");
            process::exit(1);
        }
    }

    info!("done");

    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let input_map = match &args.keymap {
        Some(filepath) => InputMap::from_file(filepath)?,
        None => InputMap::default_keymap()?,
    };

    let conf: Chip8Conf = match &args.config {
        Some(filepath) => serde_yaml::from_reader(std::fs::File::open(filepath)?)?,
        None => Chip8Conf::default(),
    };

    let mut event_loop = Chip8App::create_event_loop();
    let mut app = Chip8App::new(&event_loop, input_map, conf)?;

    app.load_rom(&args.rom)?;
    app.run(&mut event_loop)
}

fn parse_args() -> Option<Args> {
    let mut args = env::args().skip(1);
    let mut rom = None;
    let mut keymap = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--keymap" => keymap = Some(args.next()?),
            "--config" => config = Some(args.next()?),
            _ if arg.starts_with("--") => return None,
            _ if rom.is_none() => rom = Some(arg),
            _ => return None,
        }
    }

    Some(Args {
        rom: rom?,
        keymap,
        config,
    })
}
