use std::process::Command;

fn run(args: &[&str]) -> std::process::Output {
	Command::new(env!("CARGO_BIN_EXE_tilekiln")).args(args).output().unwrap()
}

#[test]
fn no_arguments_prints_usage_and_exits_nonzero() {
	let output = run(&[]);
	assert!(!output.status.success());
	let stderr = String::from_utf8(output.stderr).unwrap();
	assert!(stderr.contains("Usage: tilekiln"));
}

#[test]
fn help_flag_describes_the_flag_surface() {
	let output = run(&["--help"]);
	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout).unwrap();
	for flag in ["--format", "--min-zoom", "--max-zoom", "--tile-size", "--resampling", "--fill-color"] {
		assert!(stdout.contains(flag), "missing {flag} in help output");
	}
}

#[test]
fn version_flag_prints_a_version() {
	let output = run(&["--version"]);
	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.starts_with("tilekiln "));
}
