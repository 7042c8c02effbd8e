use std::process::ExitCode;

mod catalogue;
mod cli;
mod commands;
mod env_loader;
mod error;
mod logging;

fn main() -> ExitCode {
    env_loader::load_dotenv();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
