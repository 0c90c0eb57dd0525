//! # Burrow Host Daemon
//!
//! Main entry point for the native host.

use burrowd::config::usage;
use burrowd::{native, parse_args, Invocation};
use env_logger::Env;
use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("burrowd");

    let config = match parse_args(&args) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            eprint!("{}", usage(program));
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprint!("{}", usage(program));
            process::exit(1);
        }
    };

    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();

    if let Err(e) = native::run(config) {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}
