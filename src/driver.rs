mod config;
mod error;

use tracing::debug;

use crate::runtime::{Program, VM};

pub use config::Config;
pub use error::DriverError;

/// Loads the program `config` names and runs it on a fresh VM. Returns the
/// process exit code.
pub fn execute(config: Config) -> i32 {
    match run(&config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", err.render(config.colored()));
            err.exit_code()
        }
    }
}

fn run(config: &Config) -> Result<(), DriverError> {
    let program = load_program(config)?;

    debug!(words = program.len(), entry = config.entry, "loaded program");

    if config.disassemble {
        print!("{program}");
        return Ok(());
    }

    let mut vm = VM::new(config.vm_config());

    vm.load(program);
    let result = vm.run(config.entry);

    if config.dump {
        eprint!("{}", vm.dump().render(config.colored()));
    }

    Ok(result?)
}

fn load_program(config: &Config) -> Result<Program, DriverError> {
    let Some(path) = config.file.as_ref() else {
        return Ok(Program::demo()?);
    };

    let source = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(Program::assemble(&source)?)
}
