use anyhow::Result;
use keystone::{get_cert, Certificate, ErrorKind};
use time::macros::datetime;

/// A well-formed certificate.
const GOOD: &[u8] = include_bytes!("fixtures/good.pem");
/// The base64 body has an invalid length.
const BAD: &[u8] = include_bytes!("fixtures/bad.pem");
/// The tag of the subject's country attribute type is corrupted.
const BAD2: &[u8] = include_bytes!("fixtures/bad2.pem");

const BAD2_ERROR: &str = "asn1: structure error: tags don't match (6 vs {class:3 tag:22 \
                          length:3 isCompound:false}) {optional:false explicit:false \
                          application:false defaultValue:<nil> tag:<nil> stringType:0 \
                          timeType:0 set:false omitEmpty:false} ObjectIdentifier @2";

#[test]
fn fixtures() {
	let cases: [(&[u8], Option<&str>); 4] = [
		(GOOD, None),
		(BAD, Some("error parsing certificate")),
		(BAD2, Some(BAD2_ERROR)),
		(&[], Some("input empty")),
	];

	for (input, expected) in cases {
		match (get_cert(input), expected) {
			(Ok(_), None) => (),
			(Err(error), Some(expected)) => assert_eq!(error.to_string(), expected),
			(result, expected) => panic!("expected {expected:?}, got {result:?}"),
		}
	}
}

#[test]
fn kinds() {
	let kind = |input: &[u8]| get_cert(input).map(|_| ()).map_err(|error| error.kind());

	assert_eq!(kind(GOOD), Ok(()));
	assert_eq!(kind(BAD), Err(ErrorKind::PemDecode));
	assert_eq!(kind(BAD2), Err(ErrorKind::Asn1Structure));
	assert_eq!(kind(&[]), Err(ErrorKind::Empty));
}

#[test]
fn good() -> Result<()> {
	let certificate = get_cert(GOOD)?;

	assert_eq!(certificate.version(), 3);
	assert_eq!(certificate.serial(), "42:06:ae:ac:af:ed:96:f1");

	let subject = certificate.subject();
	assert_eq!(
		subject.to_string(),
		"C=US, ST=California, L=Mountain View, O=Google Inc, CN=*.google.com"
	);
	assert_eq!(subject.common_name(), Some("*.google.com"));
	assert_eq!(subject.organization(), Some("Google Inc"));
	assert_eq!(subject.locality(), Some("Mountain View"));
	assert_eq!(subject.state_or_province(), Some("California"));
	assert_eq!(subject.country(), Some("US"));

	let issuer = certificate.issuer();
	assert_eq!(
		issuer.to_string(),
		"C=US, O=Google Inc, CN=Google Internet Authority G2"
	);

	assert_eq!(certificate.not_before(), datetime!(2016-05-04 09:05:56 UTC));
	assert_eq!(certificate.not_after(), datetime!(2016-07-27 08:39:00 UTC));
	// long expired, which is no concern of decoding
	assert!(certificate.time_to_expiration().is_none());
	assert!(certificate.is_valid_at(datetime!(2016-06-01 00:00 UTC)));

	// sha256WithRSAEncryption and id-ecPublicKey
	assert_eq!(certificate.signature_algorithm(), "1.2.840.113549.1.1.11");
	assert_eq!(certificate.public_key_algorithm(), "1.2.840.10045.2.1");

	assert_eq!(certificate.extensions().len(), 9);
	assert!(certificate
		.extensions()
		.iter()
		.any(|extension| extension.oid() == "2.5.29.19" && extension.critical()));

	let domains = certificate.domains();
	assert_eq!(domains.len(), 52);
	assert_eq!(domains.first().map(String::as_str), Some("*.google.com"));
	assert_eq!(domains.last().map(String::as_str), Some("youtubeeducation.com"));

	Ok(())
}

#[test]
fn idempotent() -> Result<()> {
	assert_eq!(get_cert(GOOD)?, get_cert(GOOD)?);

	for input in [BAD, BAD2] {
		let first = get_cert(input).map(drop).map_err(|error| error.to_string());
		let second = get_cert(input).map(drop).map_err(|error| error.to_string());
		assert_eq!(first, second);
	}

	Ok(())
}

#[test]
fn der_round_trip() -> Result<()> {
	let certificate = get_cert(GOOD)?;
	let der: Vec<u8> = certificate.clone().into();

	assert_eq!(Certificate::try_from(der)?, certificate);

	Ok(())
}

#[test]
fn concurrent() -> Result<()> {
	let handles: Vec<_> = (0..8)
		.map(|_| std::thread::spawn(|| get_cert(GOOD).map_err(|error| error.to_string())))
		.collect();

	let expected = get_cert(GOOD)?;

	for handle in handles {
		let certificate = handle
			.join()
			.map_err(|_| anyhow::anyhow!("decoding thread panicked"))?
			.map_err(anyhow::Error::msg)?;
		assert_eq!(certificate, expected);
	}

	Ok(())
}
