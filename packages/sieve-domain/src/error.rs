pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
	#[error("Invalid option {option}: {message}")]
	InvalidOption { option: &'static str, message: String },
	#[error("{scope} scope requires at least one {field}.")]
	MissingScopeIds { scope: &'static str, field: &'static str },
	#[error("Invalid pagination: {message}")]
	InvalidPage { message: String },
}
