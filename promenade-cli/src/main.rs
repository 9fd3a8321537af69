//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use env_logger::{Builder, Env};

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    if let Err(err) = promenade_cli::run() {
        eprintln!("promenade: {err}");
        std::process::exit(1);
    }
}
