use std::{fs, io, path::Path};

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Installs the global `fmt` subscriber. Must be called at most once per process.
pub fn init_tracing(log_level: &str) {
	let filter = EnvFilter::new(log_level);

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn emit_json<T>(value: &T, path: Option<&Path>) -> io::Result<()>
where
	T: Serialize,
{
	let json = serde_json::to_string_pretty(value)?;

	match path {
		Some(path) => {
			if let Some(parent) = path.parent()
				&& !parent.as_os_str().is_empty()
			{
				fs::create_dir_all(parent)?;
			}

			fs::write(path, format!("{json}\n"))
		},
		None => {
			println!("{json}");

			Ok(())
		},
	}
}
