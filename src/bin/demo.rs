//! Demonstrates the library end to end: builds the worked-example
//! scanner (keywords, identifiers, integers, floats, whitespace — shared
//! with the crate's own test suite via
//! [`iregex::scanner::worked_example_token_types`]) and prints the token
//! stream for a file or stdin.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use iregex::{scanner::worked_example_token_types, InputStream, Scanner, StrStream};

#[derive(Parser)]
#[command(name = "iregex-demo", about = "Scan text with a small example token set")]
struct Args {
	/// File to scan; reads stdin if omitted.
	#[arg(long)]
	input: Option<PathBuf>,

	/// Increase log verbosity (-v for debug, -vv for trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn build_scanner() -> iregex::Result<Scanner> {
	Scanner::new(worked_example_token_types()?)
}

fn main() {
	let args = Args::parse();

	let level = match args.verbose {
		0 => log::LevelFilter::Warn,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};
	env_logger::Builder::new().filter_level(level).init();

	let text = match &args.input {
		Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
			eprintln!("error reading {}: {e}", path.display());
			std::process::exit(1);
		}),
		None => {
			let mut buf = String::new();
			std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
				eprintln!("error reading stdin: {e}");
				std::process::exit(1);
			});
			buf
		}
	};

	let mut scanner = build_scanner().unwrap_or_else(|e| {
		eprintln!("error building scanner: {e}");
		std::process::exit(1);
	});

	let mut stream = StrStream::new(&text);
	for token in scanner.scan(&mut stream as &mut dyn InputStream) {
		let pos = token.position();
		println!(
			"{:>10} {:>4}:{:<4} {:?}",
			token.token_type().name(),
			pos.line,
			pos.column,
			token.lexeme()
		);
	}
}
