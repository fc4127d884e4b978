pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Authorization error: {message}")]
	Authorization { message: String },
	#[error("Search engine error: {message}")]
	Engine { message: String },
	#[error("Search timed out: {message}")]
	Timeout { message: String },
	#[error("Hydration error: {message}")]
	Hydration { message: String },
}
impl From<sieve_domain::Error> for Error {
	fn from(err: sieve_domain::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<sieve_query::Error> for Error {
	fn from(err: sieve_query::Error) -> Self {
		match err {
			sieve_query::Error::InvalidRequest { message } => Self::InvalidRequest { message },
		}
	}
}

impl From<sieve_providers::Error> for Error {
	fn from(err: sieve_providers::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout { message: err.to_string() }
		} else {
			Self::Engine { message: err.to_string() }
		}
	}
}
