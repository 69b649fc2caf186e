use thiserror::Error;

/// A failed host primitive, such as a rejected range boundary or an element that couldn't be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct HostError {
	pub operation: &'static str,
	pub message: String,
}
impl HostError {
	#[must_use]
	pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
		Self {
			operation,
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error(transparent)]
	Host(#[from] HostError),

	/// A node that should already own a range (because it was mounted before) doesn't.
	#[error("expected a mounted `{0}` node, but it has no range")]
	Unmounted(String),

	#[error("depth limit reached while resolving the component tree")]
	DepthLimit,
}
