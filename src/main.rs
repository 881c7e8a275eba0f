use clap::Parser;

use ivm::driver::{execute, Config};

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(execute(config));
}
