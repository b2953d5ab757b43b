pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read {kind} file at {path:?}.")]
	ReadInput { kind: &'static str, path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse {kind} file at {path:?}.")]
	ParseInput { kind: &'static str, path: std::path::PathBuf, source: serde_json::Error },
	#[error("Invalid {kind} file: {message}")]
	InvalidInput { kind: &'static str, message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<membench_providers::Error> for Error {
	fn from(err: membench_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
