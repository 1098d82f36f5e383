use clap::Parser;
use colored::*;
use icsv::cli::{Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(true) => process::exit(0),
        // Command ran but reported failures; details are already printed
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
            process::exit(1);
        }
    }
}
