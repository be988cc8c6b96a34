//! [`Error`](std::error::Error) for this [`crate`].

use std::borrow::Cow;

use thiserror::Error;
pub use x509_parser::{error::X509Error, nom::Err};

/// [`Result`](std::result::Result) type for this [`crate`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// [`Error`](std::error::Error) for this [`crate`].
#[derive(Debug, Error)]
pub enum Error {
	/// The input contained no bytes at all.
	#[error("input empty")]
	Empty,
	/// No PEM block could be found or decoded in the input.
	#[error("error parsing certificate")]
	Pem,
	/// The decoded DER doesn't have the structure of an X.509 certificate.
	#[error(transparent)]
	Asn1(#[from] Asn1Error),
}

impl Error {
	/// Returns the [`ErrorKind`] of this [`Error`].
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Empty => ErrorKind::Empty,
			Self::Pem => ErrorKind::PemDecode,
			Self::Asn1(_) => ErrorKind::Asn1Structure,
		}
	}
}

/// Classification of an [`Error`], independent of its diagnostic.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
	/// See [`Error::Empty`].
	Empty,
	/// See [`Error::Pem`].
	PemDecode,
	/// See [`Error::Asn1`].
	Asn1Structure,
}

/// Possible ASN.1 decoding errors.
#[derive(Debug, Error)]
pub enum Asn1Error {
	/// The DER was well-formed but didn't match the expected layout.
	#[error(transparent)]
	Structure(#[from] StructuralError),
	/// The DER itself was malformed.
	#[error(transparent)]
	Syntax(#[from] SyntaxError),
	/// [`Error`](std::error::Error) returned by [`x509_parser`].
	#[error(transparent)]
	X509(Err<X509Error>),
}

/// The DER didn't match the layout expected at this position.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
#[error("asn1: structure error: {message}")]
pub struct StructuralError {
	/// Description of the mismatch.
	message: Cow<'static, str>,
}

impl StructuralError {
	pub(crate) fn new<M: Into<Cow<'static, str>>>(message: M) -> Self {
		Self {
			message: message.into(),
		}
	}

	/// Description of the mismatch, without the `asn1: structure error: `
	/// prefix.
	#[must_use]
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// The DER was malformed.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
#[error("asn1: syntax error: {message}")]
pub struct SyntaxError {
	/// Description of the malformation.
	message: &'static str,
}

impl SyntaxError {
	pub(crate) const fn new(message: &'static str) -> Self {
		Self { message }
	}

	/// Description of the malformation, without the `asn1: syntax error: `
	/// prefix.
	#[must_use]
	pub const fn message(&self) -> &'static str {
		self.message
	}
}

impl From<StructuralError> for Error {
	fn from(error: StructuralError) -> Self {
		Self::Asn1(error.into())
	}
}

impl From<SyntaxError> for Error {
	fn from(error: SyntaxError) -> Self {
		Self::Asn1(error.into())
	}
}

#[test]
fn messages() {
	assert_eq!(Error::Empty.to_string(), "input empty");
	assert_eq!(Error::Pem.to_string(), "error parsing certificate");
	assert_eq!(
		Error::from(SyntaxError::new("trailing data")).to_string(),
		"asn1: syntax error: trailing data"
	);
	assert_eq!(
		Error::from(StructuralError::new("non-minimal length")).to_string(),
		"asn1: structure error: non-minimal length"
	);
}

#[test]
fn kind() {
	assert_eq!(Error::Empty.kind(), ErrorKind::Empty);
	assert_eq!(Error::Pem.kind(), ErrorKind::PemDecode);
	assert_eq!(
		Error::from(SyntaxError::new("data truncated")).kind(),
		ErrorKind::Asn1Structure
	);
}
