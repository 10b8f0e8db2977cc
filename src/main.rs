use anyhow::{Context, Result};
use argh::FromArgs;
use log::LevelFilter;
use mish::Interpreter;
use mish::input::{BatchSource, InteractiveSource};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::fs::File;
use std::io::BufReader;
use std::str::FromStr;

const LOG_ENV: &str = "MISH_LOG";

#[derive(FromArgs)]
/// An interactive command interpreter with pipes, redirection and concurrent `&` segments.
struct Args {
    #[argh(option, from_str_fn(parse_level))]
    /// diagnostics level: off, error, warn, info, debug or trace. Falls back to $MISH_LOG, then warn.
    log_level: Option<LevelFilter>,

    #[argh(positional)]
    /// script to read commands from instead of the terminal.
    script: Vec<String>,
}

fn parse_level(s: &str) -> std::result::Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|_| format!("unknown log level: {}", s))
}

fn init_logging(flag: Option<LevelFilter>) -> Result<()> {
    let level = flag
        .or_else(|| std::env::var(LOG_ENV).ok().and_then(|v| LevelFilter::from_str(&v).ok()))
        .unwrap_or(LevelFilter::Warn);
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.log_level)?;

    let mut sh: Interpreter = Interpreter::default();
    match args.script.as_slice() {
        [] => sh.run(&mut InteractiveSource::new()?)?,
        [path] => {
            let file = File::open(path).with_context(|| format!("cannot open script {}", path))?;
            log::debug!("batch mode: {}", path);
            sh.run(&mut BatchSource::new(BufReader::new(file)))?
        }
        _ => {
            println!("Incorrect Usage. Only 0-1 arguments allowed.");
            sh.run(&mut InteractiveSource::new()?)?
        }
    }
    Ok(())
}
