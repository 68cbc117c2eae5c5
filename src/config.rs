//! Command-line configuration.

use std::path::PathBuf;

use thiserror::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP: &str = r#"
g2rc - code generator for the g2 language

USAGE:
    g2rc [OPTIONS] <input.json>

The input is a syntax tree in JSON form, as produced by the g2 parser.

OPTIONS:
    -o <file>            Write output to <file> instead of stdout
    --emit <asm|ir>      Emit SPIM assembly (default) or three-address code
    --run                Interpret the program from `main` and print what
                         it passes to println
    -h, --help           Show this help
    -V, --version        Show version

ENVIRONMENT:
    RUST_LOG             Log filter, e.g. RUST_LOG=debug (default: warn)
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
    #[default]
    Asm,
    Ir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    /// `None` means stdout
    pub output: Option<PathBuf>,
    pub emit: Emit,
    pub run: bool,
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Compile(Config),
    Help,
    Version,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no input file given")]
    MissingInput,

    #[error("option `{0}` needs a value")]
    MissingValue(String),

    #[error("unknown emit kind `{0}`, expected `asm` or `ir`")]
    UnknownEmit(String),

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("more than one input file: `{0}` and `{1}`")]
    ExtraInput(String, String),
}

impl Config {
    /// Parses the arguments after the program name
    pub fn from_args<I>(args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut input: Option<String> = None;
        let mut output = None;
        let mut emit = Emit::default();
        let mut run = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-V" | "--version" => return Ok(Command::Version),
                "-o" => {
                    let file = args.next().ok_or(ConfigError::MissingValue(arg))?;
                    output = Some(PathBuf::from(file));
                }
                "--emit" => {
                    let kind = args.next().ok_or(ConfigError::MissingValue(arg))?;
                    emit = parse_emit(&kind)?;
                }
                "--run" => run = true,
                _ if arg.starts_with("--emit=") => emit = parse_emit(&arg["--emit=".len()..])?,
                _ if arg.starts_with('-') && arg != "-" => {
                    return Err(ConfigError::UnknownOption(arg));
                }
                _ => {
                    if let Some(first) = input {
                        return Err(ConfigError::ExtraInput(first, arg));
                    }
                    input = Some(arg);
                }
            }
        }

        let input = input.ok_or(ConfigError::MissingInput)?;
        Ok(Command::Compile(Config {
            input: PathBuf::from(input),
            output,
            emit,
            run,
        }))
    }
}

fn parse_emit(kind: &str) -> Result<Emit, ConfigError> {
    match kind {
        "asm" => Ok(Emit::Asm),
        "ir" => Ok(Emit::Ir),
        other => Err(ConfigError::UnknownEmit(other.to_string())),
    }
}
