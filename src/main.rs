//! autoiso - unattended-install Ubuntu images from stock server images

use std::process::ExitCode;

use clap::Parser;

use autoiso::cli::Cli;
use autoiso::output::json::{error_code, format_error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_tracing();
    let json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json {
                match format_error(&format!("{e:#}"), error_code(&e)) {
                    Ok(out) => println!("{out}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
