mod commands;

use std::process;

use clap::Parser;

use commands::Commands;

#[derive(Parser)]
#[command(name = "ngit", about = "A read-leaning git object store explorer")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("ngit: {e}");
            process::exit(1);
        }
    }
}
