mod cli;
mod color;
mod mem;
mod metadata;
mod run;
mod sources;

use clap::Parser;

fn main() {
	let cli = cli::Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).format_timestamp(None).init();

	if let Err(err) = run::run(cli) {
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}
