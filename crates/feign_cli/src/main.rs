use std::env;
use std::process::ExitCode;

use feign_cli::{parse_args, run, DEFAULT_CONFIG_PATH, DEFAULT_SAMPLE_COUNT};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let command = parse_args(&args).map_err(|message| format!("{message}\n\n{}", usage_text()))?;
    run(command)
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    format!(
        "feign_cli: inspect configs and sample fabricated messages\n\
\n\
USAGE:\n\
  feign_cli inspect [--config PATH]\n\
  feign_cli sample [--config PATH] [--category NAME] [--count N] [--seed N]\n\
\n\
OPTIONS:\n\
  --config PATH    config file to load (default: {DEFAULT_CONFIG_PATH})\n\
  --category NAME  template category to sample (default: generic)\n\
  --count N        number of messages to generate (default: {DEFAULT_SAMPLE_COUNT})\n\
  --seed N         seed the random source for reproducible output"
    )
}
