use std::env;
use std::error::Error;
use std::fs::{File, read_to_string};
use std::io::{self, BufWriter, Write};
use std::process;

use log::info;

use g2rc::config::{Command, Config, Emit, HELP, VERSION};
use g2rc::ir::interpreter::Interpreter;
use g2rc::{emit_ir, emit_mips};

// g2rc [OPTIONS] <input.json>
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let command = match Config::from_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("g2rc: {}", err);
            eprintln!("Use --help for usage information.");
            process::exit(2);
        }
    };

    match command {
        Command::Help => println!("{}", HELP),
        Command::Version => println!("g2rc {}", VERSION),
        Command::Compile(config) => {
            if let Err(err) = run(&config) {
                eprintln!("g2rc: {}", err);
                process::exit(1);
            }
        }
    }
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let input = read_to_string(&config.input)?;
    info!("read {}", config.input.display());
    let program = g2rc::compile_json(&input)?;

    let mut output: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    if config.run {
        let mut interp = Interpreter::new(&program);
        let result = interp.call("main", &[]);
        // Print what was produced before a failure, too
        for value in interp.output() {
            writeln!(output, "{}", value)?;
        }
        output.flush()?;
        result?;
        return Ok(());
    }

    match config.emit {
        Emit::Asm => emit_mips(&program, &mut output)?,
        Emit::Ir => emit_ir(&program, &mut output)?,
    }
    output.flush()?;
    Ok(())
}
