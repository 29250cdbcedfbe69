use clap::Parser;
use edgelab::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
