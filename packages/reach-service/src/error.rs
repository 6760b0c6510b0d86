pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query must be a non-empty string.")]
	EmptyQuery,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid config: {message}")]
	InvalidConfig { message: String },
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Query timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
}
impl From<reach_storage::Error> for Error {
	fn from(err: reach_storage::Error) -> Self {
		match err {
			reach_storage::Error::Sqlx(inner) => Self::StoreUnavailable { message: inner.to_string() },
		}
	}
}

impl From<reach_providers::Error> for Error {
	fn from(err: reach_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
