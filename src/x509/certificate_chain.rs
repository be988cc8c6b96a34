//! [`CertificateChain`].

use std::{ops::Index, slice::Iter, vec::IntoIter};

use serde::{Deserialize, Serialize};

use crate::{Certificate, Decoder, Error, Result};

/// A non-empty list of [`Certificate`]s as found in a PEM bundle, the
/// end-entity [`Certificate`] first.
///
/// No chain validation is done, the order is the one of the input.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "Vec<Certificate>")]
pub struct CertificateChain(Vec<Certificate>);

impl TryFrom<Vec<Certificate>> for CertificateChain {
	type Error = Error;

	fn try_from(certificates: Vec<Certificate>) -> Result<Self, Self::Error> {
		Self::from_certificates(certificates)
	}
}

impl IntoIterator for CertificateChain {
	type IntoIter = IntoIter<Self::Item>;
	type Item = Certificate;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a CertificateChain {
	type IntoIter = Iter<'a, Certificate>;
	type Item = &'a Certificate;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl Index<usize> for CertificateChain {
	type Output = Certificate;

	fn index(&self, index: usize) -> &Self::Output {
		self.0.index(index)
	}
}

impl CertificateChain {
	/// Builds a new [`CertificateChain`] from the given [`Certificate`]s.
	///
	/// # Errors
	/// [`Error::Empty`] if no [`Certificate`]s were given.
	pub fn from_certificates<C: Into<Vec<Certificate>>>(certificates: C) -> Result<Self> {
		let certificates = certificates.into();

		if certificates.is_empty() {
			Err(Error::Empty)
		} else {
			Ok(Self(certificates))
		}
	}

	/// Decodes every certificate found in PEM-armored `input`, see
	/// [`Decoder::decode_all`].
	///
	/// # Errors
	/// - [`Error::Empty`] if `input` is empty
	/// - [`Error::Pem`] if no PEM block could be decoded
	/// - [`Error::Asn1`] if any block isn't an X.509 certificate
	pub fn from_pem(input: &[u8]) -> Result<Self> {
		Decoder::new().decode_all(input)
	}

	/// Returns the end-entity [`Certificate`].
	#[must_use]
	pub fn into_end_entity_certificate(self) -> Certificate {
		let mut certificates = self.0;
		// never empty
		certificates.swap_remove(0)
	}

	/// Returns a reference to the end-entity [`Certificate`].
	#[must_use]
	pub fn end_entity_certificate(&self) -> &Certificate {
		// never empty
		&self.0[0]
	}

	/// Returns an iterator over the [`CertificateChain`].
	pub fn iter(&self) -> Iter<'_, Certificate> {
		self.0.iter()
	}

	/// Number of [`Certificate`]s, at least one.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false`, a [`CertificateChain`] is never empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Provides a reference to the [`Certificate`] at the given index.
	#[must_use]
	pub fn get(&self, index: usize) -> Option<&Certificate> {
		self.0.get(index)
	}
}

#[test]
fn empty() {
	assert!(matches!(
		CertificateChain::from_certificates(Vec::new()),
		Err(Error::Empty)
	));
}
