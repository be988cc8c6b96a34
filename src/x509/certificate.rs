//! [`Certificate`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use x509_parser::{certificate::X509Certificate, extensions::GeneralName, prelude::FromDer};

use super::DistinguishedName;
use crate::{asn1, error::Asn1Error, Decoder, Error, Result};

/// An extension of a [`Certificate`], undecoded.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Extension {
	/// Dotted object identifier.
	oid: String,
	/// Marked as critical.
	critical: bool,
	/// DER-encoded value.
	value: Vec<u8>,
}

impl Extension {
	/// Dotted object identifier of this [`Extension`], e.g. `2.5.29.17`.
	#[must_use]
	pub fn oid(&self) -> &str {
		&self.oid
	}

	/// Returns `true` if this [`Extension`] is marked as critical.
	#[must_use]
	pub const fn critical(&self) -> bool {
		self.critical
	}

	/// DER-encoded value of this [`Extension`].
	#[must_use]
	pub fn value(&self) -> &[u8] {
		&self.value
	}
}

/// A decoded X.509 certificate.
///
/// (De)serializes as its DER encoding, deserializing decodes it again.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Certificate {
	der: Vec<u8>,
	version: u32,
	serial: String,
	signature_algorithm: String,
	issuer: DistinguishedName,
	not_before: OffsetDateTime,
	not_after: OffsetDateTime,
	subject: DistinguishedName,
	public_key_algorithm: String,
	extensions: Vec<Extension>,
	domains: Vec<String>,
}

impl AsRef<[u8]> for Certificate {
	fn as_ref(&self) -> &[u8] {
		&self.der
	}
}

impl From<Certificate> for Vec<u8> {
	fn from(certificate: Certificate) -> Self {
		certificate.der
	}
}

impl TryFrom<Vec<u8>> for Certificate {
	type Error = Error;

	fn try_from(certificate: Vec<u8>) -> Result<Self, Self::Error> {
		Self::from_der(certificate)
	}
}

impl Certificate {
	/// Decodes the first certificate found in PEM-armored `input`, see
	/// [`Decoder::decode`].
	///
	/// # Errors
	/// - [`Error::Empty`] if `input` is empty
	/// - [`Error::Pem`] if no PEM block could be decoded
	/// - [`Error::Asn1`] if the block isn't an X.509 certificate
	pub fn from_pem(input: &[u8]) -> Result<Self> {
		Decoder::new().decode(input)
	}

	/// Build [`Certificate`] from DER-format. The structure is checked field by
	/// field before the contents are decoded, so errors point at the exact
	/// element that is off.
	///
	/// This does no validation beyond decoding: expired or self-signed
	/// certificates are accepted.
	///
	/// # Errors
	/// [`Error::Asn1`] if the certificate couldn't be decoded or was followed
	/// by trailing data.
	pub fn from_der<C: Into<Vec<u8>>>(certificate: C) -> Result<Self> {
		let der = certificate.into();

		asn1::check_certificate(&der)?;

		let mut certificate = {
			let (_, parsed) = X509Certificate::from_der(&der).map_err(Asn1Error::X509)?;
			let validity = parsed.validity();

			// certificates without a subject alternative name have no domains
			let domains = parsed
				.subject_alternative_name()
				.ok()
				.flatten()
				.map(|name| {
					name.value
						.general_names
						.iter()
						.filter_map(|name| {
							if let GeneralName::DNSName(name) = name {
								Some((*name).to_owned())
							} else {
								None
							}
						})
						.collect()
				})
				.unwrap_or_default();

			Self {
				der: Vec::new(),
				version: parsed.version().0 + 1,
				serial: parsed.raw_serial_as_string(),
				signature_algorithm: parsed.signature_algorithm.algorithm.to_id_string(),
				issuer: DistinguishedName::from_x509(parsed.issuer()),
				not_before: validity.not_before.to_datetime(),
				not_after: validity.not_after.to_datetime(),
				subject: DistinguishedName::from_x509(parsed.subject()),
				public_key_algorithm: parsed.public_key().algorithm.algorithm.to_id_string(),
				extensions: parsed
					.extensions()
					.iter()
					.map(|extension| Extension {
						oid: extension.oid.to_id_string(),
						critical: extension.critical,
						value: extension.value.to_vec(),
					})
					.collect(),
				domains,
			}
		};
		certificate.der = der;

		tracing::trace!(subject = %certificate.subject, "decoded certificate");

		Ok(certificate)
	}

	/// X.509 version, `1` to `3`.
	#[must_use]
	pub const fn version(&self) -> u32 {
		self.version
	}

	/// Serial number as colon separated hex bytes.
	#[must_use]
	pub fn serial(&self) -> &str {
		&self.serial
	}

	/// Dotted object identifier of the signature algorithm.
	#[must_use]
	pub fn signature_algorithm(&self) -> &str {
		&self.signature_algorithm
	}

	/// Dotted object identifier of the subject's public key algorithm.
	#[must_use]
	pub fn public_key_algorithm(&self) -> &str {
		&self.public_key_algorithm
	}

	#[must_use]
	pub const fn issuer(&self) -> &DistinguishedName {
		&self.issuer
	}

	#[must_use]
	pub const fn subject(&self) -> &DistinguishedName {
		&self.subject
	}

	/// Start of the validity period.
	#[must_use]
	pub const fn not_before(&self) -> OffsetDateTime {
		self.not_before
	}

	/// End of the validity period.
	#[must_use]
	pub const fn not_after(&self) -> OffsetDateTime {
		self.not_after
	}

	#[must_use]
	pub fn extensions(&self) -> &[Extension] {
		&self.extensions
	}

	/// DNS names of the subject alternative name extension.
	#[must_use]
	pub fn domains(&self) -> &[String] {
		&self.domains
	}

	/// Returns `true` if `time` lies in the validity period.
	#[must_use]
	pub fn is_valid_at(&self, time: OffsetDateTime) -> bool {
		self.not_before <= time && time <= self.not_after
	}

	/// Time left until this [`Certificate`] expires, [`None`] if it isn't
	/// valid now.
	#[must_use]
	pub fn time_to_expiration(&self) -> Option<Duration> {
		let now = OffsetDateTime::now_utc();

		if self.is_valid_at(now) {
			Duration::try_from(self.not_after - now).ok()
		} else {
			None
		}
	}
}

#[cfg(test)]
mod test {
	use rcgen::{CertificateParams, DistinguishedName as Names, DnType};
	use time::macros::datetime;

	use super::*;

	fn generate() -> anyhow::Result<rcgen::Certificate> {
		let mut params = CertificateParams::new(vec![
			String::from("test.keystone"),
			String::from("*.test.keystone"),
		]);
		params.not_before = rcgen::date_time_ymd(2021, 5, 4);
		params.not_after = rcgen::date_time_ymd(2031, 5, 4);
		params.distinguished_name = Names::new();
		params.distinguished_name.push(DnType::CountryName, "CH");
		params.distinguished_name.push(DnType::OrganizationName, "Keystone");
		params.distinguished_name.push(DnType::CommonName, "test.keystone");

		Ok(rcgen::Certificate::from_params(params)?)
	}

	#[test]
	fn validate() -> anyhow::Result<()> {
		let generated = generate()?;
		let der = generated.serialize_der()?;
		let certificate = Certificate::from_der(der.clone())?;

		assert_eq!(certificate.as_ref(), der);
		assert_eq!(certificate.version(), 3);
		assert_eq!(certificate.subject().common_name(), Some("test.keystone"));
		assert_eq!(certificate.subject().organization(), Some("Keystone"));
		assert_eq!(certificate.subject().country(), Some("CH"));
		// self-signed
		assert_eq!(certificate.issuer(), certificate.subject());
		assert_eq!(certificate.not_before(), datetime!(2021-05-04 00:00 UTC));
		assert_eq!(certificate.not_after(), datetime!(2031-05-04 00:00 UTC));
		assert_eq!(
			certificate.domains(),
			["test.keystone", "*.test.keystone"]
		);
		// ecdsa-with-SHA256 and id-ecPublicKey
		assert_eq!(certificate.signature_algorithm(), "1.2.840.10045.4.3.2");
		assert_eq!(certificate.public_key_algorithm(), "1.2.840.10045.2.1");
		assert!(certificate
			.extensions()
			.iter()
			.any(|extension| extension.oid() == "2.5.29.17"));

		Ok(())
	}

	#[test]
	fn pem() -> anyhow::Result<()> {
		let generated = generate()?;
		let from_pem = Certificate::from_pem(generated.serialize_pem()?.as_bytes())?;
		let from_der = Certificate::from_der(from_pem.as_ref())?;

		assert_eq!(from_pem, from_der);

		Ok(())
	}

	#[test]
	fn validity() -> anyhow::Result<()> {
		let certificate = Certificate::from_der(generate()?.serialize_der()?)?;

		assert!(certificate.is_valid_at(datetime!(2021-05-04 00:00 UTC)));
		assert!(certificate.is_valid_at(datetime!(2031-05-04 00:00 UTC)));
		assert!(!certificate.is_valid_at(datetime!(2021-05-03 23:59:59 UTC)));
		assert!(!certificate.is_valid_at(datetime!(2031-05-04 00:00:01 UTC)));

		Ok(())
	}

	#[test]
	fn trailing_data() -> anyhow::Result<()> {
		let mut der = generate()?.serialize_der()?;
		der.push(0);

		assert_eq!(
			Certificate::from_der(der)
				.expect_err("expected an error")
				.to_string(),
			"asn1: syntax error: trailing data"
		);

		Ok(())
	}

	#[test]
	fn truncated() -> anyhow::Result<()> {
		let mut der = generate()?.serialize_der()?;
		der.truncate(der.len() - 1);

		assert_eq!(
			Certificate::from_der(der)
				.expect_err("expected an error")
				.to_string(),
			"asn1: syntax error: data truncated"
		);

		Ok(())
	}

	#[test]
	fn serialize() -> anyhow::Result<()> {
		let certificate = Certificate::from_der(generate()?.serialize_der()?)?;
		let buffer = bincode::serialize(&certificate)?;

		assert_eq!(certificate, bincode::deserialize(&buffer)?);
		assert!(bincode::deserialize::<Certificate>(&bincode::serialize(&vec![0_u8; 4])?).is_err());

		Ok(())
	}
}
