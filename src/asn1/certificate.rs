//! Layout of an X.509 certificate, see
//! [RFC 5280](https://www.rfc-editor.org/rfc/rfc5280#section-4.1).

use super::{
	sequence_of, value, Element, FieldParameters, Fields, Kind, TAG_SEQUENCE, TAG_SET,
};
use crate::error::{Asn1Error, SyntaxError};

/// Walks `der` as a certificate. The outer layout is checked first, the
/// subject and issuer names afterwards.
///
/// # Errors
/// [`Asn1Error`] describing the first deviation found.
pub(crate) fn check_certificate(der: &[u8]) -> Result<(), Asn1Error> {
	let mut outer = Fields::new(der);
	let certificate = outer.required(Kind::Sequence, FieldParameters::PLAIN, "Certificate")?;

	let mut fields = Fields::new(certificate.contents);
	let tbs = fields.required(Kind::Sequence, FieldParameters::PLAIN, "TBSCertificate")?;
	let (issuer, subject) = tbs_certificate(tbs.contents)?;
	algorithm_identifier(&mut fields)?;
	bit_string(&mut fields)?;

	if !outer.is_empty() {
		return Err(SyntaxError::new("trailing data").into());
	}

	name(subject.raw)?;
	name(issuer.raw)?;

	Ok(())
}

/// Returns the issuer and subject, which are checked separately.
fn tbs_certificate(contents: &[u8]) -> Result<(Element<'_>, Element<'_>), Asn1Error> {
	let mut fields = Fields::new(contents);

	let version = FieldParameters {
		default_value: Some(0),
		..FieldParameters::explicit(0)
	};

	if let Some(version) = fields.next(Kind::Integer, version, "int")? {
		value::small_integer(version.contents)?;
	}

	let serial = fields.required(Kind::Integer, FieldParameters::PLAIN, "Int")?;
	value::integer(serial.contents)?;

	algorithm_identifier(&mut fields)?;
	let issuer = fields.required(Kind::Raw, FieldParameters::PLAIN, "RawValue")?;

	let validity = fields.required(Kind::Sequence, FieldParameters::PLAIN, "Validity")?;
	let mut times = Fields::new(validity.contents);
	for _ in 0..2 {
		let time = times.required(Kind::Time, FieldParameters::PLAIN, "Time")?;
		value::time(time.header.tag, time.contents)?;
	}

	let subject = fields.required(Kind::Raw, FieldParameters::PLAIN, "RawValue")?;

	let public_key =
		fields.required(Kind::Sequence, FieldParameters::PLAIN, "SubjectPublicKeyInfo")?;
	let mut public_key = Fields::new(public_key.contents);
	algorithm_identifier(&mut public_key)?;
	bit_string(&mut public_key)?;

	for tag in [1, 2] {
		if let Some(unique_id) =
			fields.next(Kind::BitString, FieldParameters::tagged(tag), "BitString")?
		{
			value::bit_string(unique_id.contents)?;
		}
	}

	if let Some(extensions) =
		fields.next(Kind::Sequence, FieldParameters::explicit(3), "Extensions")?
	{
		sequence_of(extensions.contents, TAG_SEQUENCE, true, extension)?;
	}

	Ok((issuer, subject))
}

fn algorithm_identifier(fields: &mut Fields<'_>) -> Result<(), Asn1Error> {
	let algorithm =
		fields.required(Kind::Sequence, FieldParameters::PLAIN, "AlgorithmIdentifier")?;
	let mut fields = Fields::new(algorithm.contents);

	let oid = fields.required(
		Kind::ObjectIdentifier,
		FieldParameters::PLAIN,
		"ObjectIdentifier",
	)?;
	value::object_identifier(oid.contents)?;
	// parameters depend on the algorithm
	let _ = fields.next(Kind::Raw, FieldParameters::OPTIONAL, "RawValue")?;

	Ok(())
}

fn bit_string(fields: &mut Fields<'_>) -> Result<(), Asn1Error> {
	let bits = fields.required(Kind::BitString, FieldParameters::PLAIN, "BitString")?;
	value::bit_string(bits.contents)
}

fn extension(fields: &mut Fields<'_>) -> Result<(), Asn1Error> {
	let extension = fields.required(Kind::Sequence, FieldParameters::PLAIN, "Extension")?;
	let mut fields = Fields::new(extension.contents);

	let oid = fields.required(
		Kind::ObjectIdentifier,
		FieldParameters::PLAIN,
		"ObjectIdentifier",
	)?;
	value::object_identifier(oid.contents)?;

	if let Some(critical) = fields.next(Kind::Boolean, FieldParameters::OPTIONAL, "bool")? {
		value::boolean(critical.contents)?;
	}

	// the value is checked by `x509-parser`, if it knows the extension
	let _ = fields.required(Kind::OctetString, FieldParameters::PLAIN, "")?;

	Ok(())
}

/// `Name`, a `SEQUENCE OF` relative distinguished names, each a `SET OF`
/// attributes.
fn name(raw: &[u8]) -> Result<(), Asn1Error> {
	let mut outer = Fields::new(raw);
	let sequence = outer.required(Kind::Sequence, FieldParameters::PLAIN, "RDNSequence")?;

	sequence_of(sequence.contents, TAG_SET, true, |fields| {
		let set = fields.required(
			Kind::Set,
			FieldParameters::PLAIN,
			"RelativeDistinguishedNameSET",
		)?;

		sequence_of(set.contents, TAG_SEQUENCE, true, attribute)
	})
}

fn attribute(fields: &mut Fields<'_>) -> Result<(), Asn1Error> {
	let attribute = fields.required(
		Kind::Sequence,
		FieldParameters::PLAIN,
		"AttributeTypeAndValue",
	)?;
	let mut fields = Fields::new(attribute.contents);

	let oid = fields.required(
		Kind::ObjectIdentifier,
		FieldParameters::PLAIN,
		"ObjectIdentifier",
	)?;
	value::object_identifier(oid.contents)?;

	let value = fields.required(Kind::Value, FieldParameters::PLAIN, "")?;
	value::any(&value)
}

#[cfg(test)]
mod test {
	use super::*;

	/// Wraps `contents` into a `SEQUENCE`, short form lengths only.
	fn sequence(contents: &[u8]) -> Vec<u8> {
		let mut sequence = vec![0x30, u8::try_from(contents.len()).expect("too long")];
		sequence.extend_from_slice(contents);
		sequence
	}

	/// `C=US`
	const COUNTRY: &[u8] = &[
		0x31, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x04, 0x06, 0x13, 0x02, 0x55, 0x53,
	];

	#[test]
	fn names() -> anyhow::Result<()> {
		name(&sequence(COUNTRY))?;
		name(&sequence(&[]))?;

		Ok(())
	}

	#[test]
	fn corrupted_attribute_type() {
		let mut corrupted = COUNTRY.to_vec();
		corrupted[4] = 0xd6;

		assert_eq!(
			name(&sequence(&corrupted))
				.expect_err("expected an error")
				.to_string(),
			"asn1: structure error: tags don't match (6 vs {class:3 tag:22 length:3 \
			 isCompound:false}) {optional:false explicit:false application:false \
			 defaultValue:<nil> tag:<nil> stringType:0 timeType:0 set:false omitEmpty:false} \
			 ObjectIdentifier @2"
		);
	}

	#[test]
	fn invalid_attribute_value() {
		let mut corrupted = COUNTRY.to_vec();
		corrupted[12] = b'_';

		assert_eq!(
			name(&sequence(&corrupted))
				.expect_err("expected an error")
				.to_string(),
			"asn1: syntax error: PrintableString contains invalid character"
		);
	}

	#[test]
	fn name_not_a_sequence() {
		assert_eq!(
			name(COUNTRY).expect_err("expected an error").to_string(),
			"asn1: structure error: tags don't match (16 vs {class:0 tag:17 length:11 \
			 isCompound:true}) {optional:false explicit:false application:false \
			 defaultValue:<nil> tag:<nil> stringType:0 timeType:0 set:false omitEmpty:false} \
			 RDNSequence @2"
		);
	}

	#[test]
	fn truncated_certificate() {
		assert_eq!(
			check_certificate(&[0x30, 0x03, 0x30])
				.expect_err("expected an error")
				.to_string(),
			"asn1: syntax error: data truncated"
		);
		assert_eq!(
			check_certificate(&[0x30, 0x00])
				.expect_err("expected an error")
				.to_string(),
			"asn1: syntax error: sequence truncated"
		);
	}
}
