//! Checks on the contents of primitive elements.

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use super::{
	parse_base128, Element, CLASS_UNIVERSAL, TAG_BIT_STRING, TAG_BMP_STRING, TAG_GENERALIZED_TIME,
	TAG_IA5_STRING, TAG_INTEGER, TAG_NUMERIC_STRING, TAG_OID, TAG_PRINTABLE_STRING,
	TAG_UTC_TIME, TAG_UTF8_STRING,
};
use crate::error::{Asn1Error, StructuralError, SyntaxError};

/// A DER `BOOLEAN` is exactly one byte, all bits set or none.
pub(crate) fn boolean(contents: &[u8]) -> Result<(), Asn1Error> {
	match contents {
		[0x00 | 0xff] => Ok(()),
		_ => Err(SyntaxError::new("invalid boolean").into()),
	}
}

/// An `INTEGER` of arbitrary size.
pub(crate) fn integer(contents: &[u8]) -> Result<(), Asn1Error> {
	match contents {
		[] => Err(StructuralError::new("empty integer").into()),
		[0x00, next, ..] if next & 0x80 == 0 =>
			Err(StructuralError::new("integer not minimally-encoded").into()),
		[0xff, next, ..] if next & 0x80 == 0x80 =>
			Err(StructuralError::new("integer not minimally-encoded").into()),
		_ => Ok(()),
	}
}

/// An `INTEGER` that has to fit into 64 bits.
pub(crate) fn small_integer(contents: &[u8]) -> Result<(), Asn1Error> {
	integer(contents)?;

	if contents.len() > 8 {
		return Err(StructuralError::new("integer too large").into());
	}

	Ok(())
}

/// A `BIT STRING`, the first byte counts the unused bits of the last one.
pub(crate) fn bit_string(contents: &[u8]) -> Result<(), Asn1Error> {
	let (&padding, bits) = contents
		.split_first()
		.ok_or(SyntaxError::new("zero length BIT STRING"))?;

	let valid = match bits.last() {
		_ if padding > 7 => false,
		None => padding == 0,
		Some(last) => last & ((1 << padding) - 1) == 0,
	};

	if valid {
		Ok(())
	} else {
		Err(SyntaxError::new("invalid padding bits in BIT STRING").into())
	}
}

/// An `OBJECT IDENTIFIER`, a non-empty list of base-128 arcs.
pub(crate) fn object_identifier(contents: &[u8]) -> Result<(), Asn1Error> {
	if contents.is_empty() {
		return Err(SyntaxError::new("zero length OBJECT IDENTIFIER").into());
	}

	let mut offset = 0;

	while offset < contents.len() {
		(_, offset) = parse_base128(contents, offset)?;
	}

	Ok(())
}

/// A `UTCTime` or `GeneralizedTime`, depending on `tag`.
pub(crate) fn time(tag: u32, contents: &[u8]) -> Result<OffsetDateTime, Asn1Error> {
	if tag == TAG_GENERALIZED_TIME {
		parse_generalized_time(contents)
			.ok_or_else(|| SyntaxError::new("invalid GeneralizedTime").into())
	} else {
		parse_utc_time(contents).ok_or_else(|| SyntaxError::new("invalid UTCTime").into())
	}
}

/// Checks a value of unknown type, only primitive universal values are
/// looked into.
pub(crate) fn any(element: &Element<'_>) -> Result<(), Asn1Error> {
	let header = element.header;
	let contents = element.contents;

	if header.is_compound || header.class != CLASS_UNIVERSAL {
		return Ok(());
	}

	match header.tag {
		TAG_PRINTABLE_STRING =>
			if !contents.iter().copied().all(is_printable) {
				return Err(
					SyntaxError::new("PrintableString contains invalid character").into(),
				);
			},
		TAG_IA5_STRING =>
			if !contents.is_ascii() {
				return Err(SyntaxError::new("IA5String contains invalid character").into());
			},
		TAG_NUMERIC_STRING =>
			if !contents
				.iter()
				.all(|byte| byte.is_ascii_digit() || *byte == b' ')
			{
				return Err(
					SyntaxError::new("NumericString contains invalid character").into(),
				);
			},
		TAG_UTF8_STRING =>
			if std::str::from_utf8(contents).is_err() {
				return Err(SyntaxError::new("invalid UTF-8 string").into());
			},
		TAG_BMP_STRING =>
			if contents.len() % 2 != 0 {
				return Err(SyntaxError::new("invalid BMPString").into());
			},
		TAG_INTEGER => small_integer(contents)?,
		TAG_BIT_STRING => bit_string(contents)?,
		TAG_OID => object_identifier(contents)?,
		TAG_UTC_TIME | TAG_GENERALIZED_TIME => {
			time(header.tag, contents)?;
		}
		_ => (),
	}

	Ok(())
}

/// `PrintableString` alphabet, `*` and `&` are common enough in the wild to
/// be let through.
const fn is_printable(byte: u8) -> bool {
	matches!(
		byte,
		b'a'..=b'z'
			| b'A'..=b'Z'
			| b'0'..=b'9'
			| b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'='
			| b'?' | b' ' | b'*' | b'&'
	)
}

/// `YYMMDDhhmm[ss](Z|+hhmm|-hhmm)`
fn parse_utc_time(input: &[u8]) -> Option<OffsetDateTime> {
	let (year, rest) = digits(input, 2)?;
	// two digit years cover 1950 to 2049
	let year = if year >= 50 { 1900 + year } else { 2000 + year };
	let (month, rest) = digits(rest, 2)?;
	let (day, rest) = digits(rest, 2)?;
	let (hour, rest) = digits(rest, 2)?;
	let (minute, rest) = digits(rest, 2)?;
	let (second, rest) = if rest.first()?.is_ascii_digit() {
		digits(rest, 2)?
	} else {
		(0, rest)
	};

	date_time(year, [month, day, hour, minute, second], 0, offset(rest)?)
}

/// `YYYYMMDDhhmmss[.f+](Z|+hhmm|-hhmm)`
fn parse_generalized_time(input: &[u8]) -> Option<OffsetDateTime> {
	let (year, rest) = digits(input, 4)?;
	let (month, rest) = digits(rest, 2)?;
	let (day, rest) = digits(rest, 2)?;
	let (hour, rest) = digits(rest, 2)?;
	let (minute, rest) = digits(rest, 2)?;
	let (second, mut rest) = digits(rest, 2)?;

	let mut nanosecond = 0;

	if let Some(fraction) = rest.strip_prefix(b".") {
		let count = fraction
			.iter()
			.take_while(|byte| byte.is_ascii_digit())
			.count();

		if count == 0 || count > 9 {
			return None;
		}

		let (value, after) = digits(fraction, count)?;
		nanosecond = value * 10_u32.pow(9 - u32::try_from(count).ok()?);
		rest = after;
	}

	date_time(year, [month, day, hour, minute, second], nanosecond, offset(rest)?)
}

/// Reads exactly `count` decimal digits.
fn digits(input: &[u8], count: usize) -> Option<(u32, &[u8])> {
	let (digits, rest) = (input.get(..count)?, &input[count..]);
	let value = digits.iter().try_fold(0_u32, |value, byte| {
		byte.is_ascii_digit()
			.then(|| value * 10 + u32::from(byte - b'0'))
	})?;

	Some((value, rest))
}

/// `Z` or a `+hhmm`/`-hhmm` offset, ending the input.
fn offset(input: &[u8]) -> Option<UtcOffset> {
	match input {
		b"Z" => Some(UtcOffset::UTC),
		[sign @ (b'+' | b'-'), rest @ ..] => {
			let (hours, rest) = digits(rest, 2)?;
			let (minutes, rest) = digits(rest, 2)?;

			if !rest.is_empty() {
				return None;
			}

			let hours = i8::try_from(hours).ok()?;
			let minutes = i8::try_from(minutes).ok()?;

			if *sign == b'-' {
				UtcOffset::from_hms(-hours, -minutes, 0).ok()
			} else {
				UtcOffset::from_hms(hours, minutes, 0).ok()
			}
		}
		_ => None,
	}
}

fn date_time(
	year: u32,
	[month, day, hour, minute, second]: [u32; 5],
	nanosecond: u32,
	offset: UtcOffset,
) -> Option<OffsetDateTime> {
	let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
	let date =
		Date::from_calendar_date(i32::try_from(year).ok()?, month, u8::try_from(day).ok()?).ok()?;
	let time = Time::from_hms_nano(
		u8::try_from(hour).ok()?,
		u8::try_from(minute).ok()?,
		u8::try_from(second).ok()?,
		nanosecond,
	)
	.ok()?;

	Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}
