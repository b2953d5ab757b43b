use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}

	/// Configuration mistakes and client-side HTTP rejections fail the same way on every attempt.
	/// Timeouts, connection failures, `429` and `5xx` responses are retried.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Reqwest(err) => match err.status() {
				Some(status) =>
					status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
				None => !err.is_builder(),
			},
			Self::SerdeJson(_) | Self::InvalidResponse { .. } => true,
			Self::InvalidHeaderName(_) | Self::InvalidHeaderValue(_) | Self::InvalidConfig { .. } =>
				false,
		}
	}
}
