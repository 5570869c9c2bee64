#![deny(unsafe_code)]

use mimalloc::MiMalloc;

/// High-performance memory allocator for improved allocation throughput.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[path = "cli.rs"]
mod cli;

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    cli::init_diagnostics();

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    cli::run_with(env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
