//! Structural DER decoding.
//!
//! This walks DER field by field against an expected layout and reports the
//! first deviation with the position and header it was found at. It doesn't
//! build any values, [`x509_parser`] does that once the layout is known to be
//! sound.

mod certificate;
mod value;

use std::fmt::{self, Display, Formatter};

pub(crate) use certificate::check_certificate;

use crate::error::{Asn1Error, StructuralError, SyntaxError};

pub(crate) const CLASS_UNIVERSAL: u8 = 0;
pub(crate) const CLASS_APPLICATION: u8 = 1;
pub(crate) const CLASS_CONTEXT_SPECIFIC: u8 = 2;

pub(crate) const TAG_BOOLEAN: u32 = 1;
pub(crate) const TAG_INTEGER: u32 = 2;
pub(crate) const TAG_BIT_STRING: u32 = 3;
pub(crate) const TAG_OCTET_STRING: u32 = 4;
pub(crate) const TAG_OID: u32 = 6;
pub(crate) const TAG_UTF8_STRING: u32 = 12;
pub(crate) const TAG_SEQUENCE: u32 = 16;
pub(crate) const TAG_SET: u32 = 17;
pub(crate) const TAG_NUMERIC_STRING: u32 = 18;
pub(crate) const TAG_PRINTABLE_STRING: u32 = 19;
pub(crate) const TAG_T61_STRING: u32 = 20;
pub(crate) const TAG_IA5_STRING: u32 = 22;
pub(crate) const TAG_UTC_TIME: u32 = 23;
pub(crate) const TAG_GENERALIZED_TIME: u32 = 24;
pub(crate) const TAG_GENERAL_STRING: u32 = 27;
pub(crate) const TAG_BMP_STRING: u32 = 30;

/// Upper bound for lengths, far above anything a certificate needs.
const MAX_LENGTH: usize = 1 << 23;

/// Identifier and length octets of a DER element.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TagAndLength {
	/// Class bits, `0` universal to `3` private.
	pub class: u8,
	/// Tag number.
	pub tag: u32,
	/// Length of the contents.
	pub length: usize,
	/// Constructed or primitive encoding.
	pub is_compound: bool,
}

impl Display for TagAndLength {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{class:{} tag:{} length:{} isCompound:{}}}",
			self.class, self.tag, self.length, self.is_compound
		)
	}
}

impl TagAndLength {
	/// Reads the header at `offset`. Returns it with the offset of the
	/// contents.
	///
	/// # Errors
	/// [`Asn1Error`] if the header is truncated or not minimally encoded.
	pub fn parse(bytes: &[u8], offset: usize) -> Result<(Self, usize), Asn1Error> {
		let mut offset = offset;
		let identifier = *bytes
			.get(offset)
			.ok_or(SyntaxError::new("truncated tag or length"))?;
		offset += 1;

		let class = identifier >> 6;
		let is_compound = identifier & 0x20 == 0x20;
		let mut tag = u32::from(identifier & 0x1f);

		// high tag number form
		if tag == 0x1f {
			(tag, offset) = parse_base128(bytes, offset)?;

			if tag < 0x1f {
				return Err(SyntaxError::new("non-minimal tag").into());
			}
		}

		let first = *bytes
			.get(offset)
			.ok_or(SyntaxError::new("truncated tag or length"))?;
		offset += 1;

		let length = if first & 0x80 == 0 {
			usize::from(first & 0x7f)
		} else {
			let count = usize::from(first & 0x7f);

			if count == 0 {
				return Err(SyntaxError::new("indefinite length found (not DER)").into());
			}

			let mut length: usize = 0;

			for _ in 0..count {
				let byte = *bytes
					.get(offset)
					.ok_or(SyntaxError::new("truncated tag or length"))?;
				offset += 1;

				if length >= MAX_LENGTH {
					return Err(StructuralError::new("length too large").into());
				}

				length = (length << 8) | usize::from(byte);

				if length == 0 {
					return Err(StructuralError::new("superfluous leading zeros in length").into());
				}
			}

			if length < 0x80 {
				return Err(StructuralError::new("non-minimal length").into());
			}

			length
		};

		Ok((
			Self {
				class,
				tag,
				length,
				is_compound,
			},
			offset,
		))
	}
}

/// Reads a base-128 integer as used by high tag numbers and object identifier
/// arcs. Returns it with the offset following it.
pub(crate) fn parse_base128(bytes: &[u8], mut offset: usize) -> Result<(u32, usize), Asn1Error> {
	let mut value: u64 = 0;
	let mut shifted = 0;

	while let Some(&byte) = bytes.get(offset) {
		if shifted == 5 {
			return Err(StructuralError::new("base 128 integer too large").into());
		}

		if shifted == 0 && byte == 0x80 {
			return Err(SyntaxError::new("integer is not minimally encoded").into());
		}

		value = (value << 7) | u64::from(byte & 0x7f);
		offset += 1;
		shifted += 1;

		if byte & 0x80 == 0 {
			// same bound for tags and arcs
			let value = u32::try_from(value)
				.ok()
				.filter(|value| *value <= i32::MAX.unsigned_abs())
				.ok_or_else(|| StructuralError::new("base 128 integer too large"))?;
			return Ok((value, offset));
		}
	}

	Err(SyntaxError::new("truncated base 128 integer").into())
}

/// Options attached to a field of an expected layout.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FieldParameters {
	/// The field may be absent.
	pub optional: bool,
	/// The field is wrapped in an additional tag.
	pub explicit: bool,
	/// The tag in [`tag`](Self::tag) is of the application class.
	pub application: bool,
	/// Value assumed if an [`optional`](Self::optional) field is absent.
	pub default_value: Option<i64>,
	/// Context specific tag replacing the universal one.
	pub tag: Option<u32>,
	/// Universal tag of the string type, `0` for the natural one.
	pub string_type: u32,
	/// Universal tag of the time type, `0` for the natural one.
	pub time_type: u32,
	/// The field is a `SET` instead of a `SEQUENCE`.
	pub set: bool,
	/// The field is left out when empty.
	pub omit_empty: bool,
}

impl FieldParameters {
	/// An `OPTIONAL` field.
	pub(crate) const OPTIONAL: Self = Self {
		optional: true,
		explicit: false,
		application: false,
		default_value: None,
		tag: None,
		string_type: 0,
		time_type: 0,
		set: false,
		omit_empty: false,
	};

	/// A field without any options.
	pub(crate) const PLAIN: Self = Self {
		optional: false,
		..Self::OPTIONAL
	};

	/// An `OPTIONAL` field with a context specific tag.
	pub(crate) const fn tagged(tag: u32) -> Self {
		Self {
			tag: Some(tag),
			..Self::OPTIONAL
		}
	}

	/// An `OPTIONAL` field wrapped in a context specific tag.
	pub(crate) const fn explicit(tag: u32) -> Self {
		Self {
			explicit: true,
			..Self::tagged(tag)
		}
	}
}

/// Writes an optional value, `<nil>` if absent.
struct Nullable<T>(Option<T>);

impl<T: Display> Display for Nullable<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0 {
			Some(value) => value.fmt(f),
			None => f.write_str("<nil>"),
		}
	}
}

impl Display for FieldParameters {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{optional:{} explicit:{} application:{} defaultValue:{} tag:{} stringType:{} \
			 timeType:{} set:{} omitEmpty:{}}}",
			self.optional,
			self.explicit,
			self.application,
			Nullable(self.default_value),
			Nullable(self.tag),
			self.string_type,
			self.time_type,
			self.set,
			self.omit_empty
		)
	}
}

/// ASN.1 type expected for a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Kind {
	/// Any element at all, kept raw.
	Raw,
	/// Any element, primitive universal values are checked.
	Value,
	Boolean,
	Integer,
	BitString,
	OctetString,
	ObjectIdentifier,
	/// `UTCTime` or `GeneralizedTime`.
	Time,
	Sequence,
	Set,
}

impl Kind {
	/// Returns if any tag matches, the expected universal tag and if the
	/// encoding is constructed.
	const fn universal(self) -> (bool, u32, bool) {
		match self {
			Self::Raw | Self::Value => (true, 0, false),
			Self::Boolean => (false, TAG_BOOLEAN, false),
			Self::Integer => (false, TAG_INTEGER, false),
			Self::BitString => (false, TAG_BIT_STRING, false),
			Self::OctetString => (false, TAG_OCTET_STRING, false),
			Self::ObjectIdentifier => (false, TAG_OID, false),
			Self::Time => (false, TAG_UTC_TIME, false),
			Self::Sequence => (false, TAG_SEQUENCE, true),
			Self::Set => (false, TAG_SET, true),
		}
	}
}

/// A DER element found in place of a field.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Element<'a> {
	/// Header of the element, inside the explicit tag if there is one.
	pub(crate) header: TagAndLength,
	/// The element including its header.
	pub(crate) raw: &'a [u8],
	/// Contents of the element.
	pub(crate) contents: &'a [u8],
}

/// Contents of a constructed element, consumed field by field.
///
/// Offsets in diagnostics are relative to these contents.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Fields<'a> {
	bytes: &'a [u8],
	offset: usize,
}

impl<'a> Fields<'a> {
	pub(crate) const fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, offset: 0 }
	}

	/// Returns `true` if all fields have been consumed.
	pub(crate) const fn is_empty(&self) -> bool {
		self.offset == self.bytes.len()
	}

	/// Reads the next field. Returns [`None`] if an
	/// [`optional`](FieldParameters::optional) field is absent, in which case
	/// nothing is consumed.
	pub(crate) fn next(
		&mut self,
		kind: Kind,
		params: FieldParameters,
		name: &'static str,
	) -> Result<Option<Element<'a>>, Asn1Error> {
		let start = self.offset;

		if self.is_empty() {
			return if params.optional {
				Ok(None)
			} else {
				Err(SyntaxError::new("sequence truncated").into())
			};
		}

		let (mut header, mut offset) = TagAndLength::parse(self.bytes, start)?;

		if params.explicit {
			let class = if params.application {
				CLASS_APPLICATION
			} else {
				CLASS_CONTEXT_SPECIFIC
			};

			if offset == self.bytes.len() {
				return Err(StructuralError::new("explicit tag has no child").into());
			}

			if header.class == class
				&& Some(header.tag) == params.tag
				&& (header.length == 0 || header.is_compound)
			{
				if header.length == 0 {
					return Err(StructuralError::new("zero length explicit tag").into());
				}

				(header, offset) = TagAndLength::parse(self.bytes, offset)?;
			} else if params.optional {
				return Ok(None);
			} else {
				return Err(StructuralError::new("explicitly tagged member didn't match").into());
			}
		}

		let (match_any, mut expected_tag, compound) = kind.universal();

		if kind == Kind::Time
			&& header.class == CLASS_UNIVERSAL
			&& header.tag == TAG_GENERALIZED_TIME
		{
			expected_tag = TAG_GENERALIZED_TIME;
		}

		if params.set {
			expected_tag = TAG_SET;
		}

		let mut match_any_class_and_tag = match_any;
		let mut expected_class = CLASS_UNIVERSAL;

		if let (false, Some(tag)) = (params.explicit, params.tag) {
			expected_class = if params.application {
				CLASS_APPLICATION
			} else {
				CLASS_CONTEXT_SPECIFIC
			};
			expected_tag = tag;
			match_any_class_and_tag = false;
		}

		if (!match_any_class_and_tag
			&& (header.class != expected_class || header.tag != expected_tag))
			|| (!match_any && header.is_compound != compound)
		{
			return if params.optional {
				Ok(None)
			} else {
				Err(StructuralError::new(format!(
					"tags don't match ({expected_tag} vs {header}) {params} {name} @{offset}"
				))
				.into())
			};
		}

		let end = offset
			.checked_add(header.length)
			.filter(|end| *end <= self.bytes.len())
			.ok_or(SyntaxError::new("data truncated"))?;

		let element = Element {
			header,
			raw: &self.bytes[start..end],
			contents: &self.bytes[offset..end],
		};
		self.offset = end;

		Ok(Some(element))
	}

	/// Reads the next field, which must be present.
	pub(crate) fn required(
		&mut self,
		kind: Kind,
		params: FieldParameters,
		name: &'static str,
	) -> Result<Element<'a>, Asn1Error> {
		self.next(kind, params, name)?
			.ok_or_else(|| SyntaxError::new("sequence truncated").into())
	}
}

/// Walks the contents of a `SEQUENCE OF` or `SET OF` whose elements all have
/// the universal `tag`, calling `element` once per element.
///
/// All headers are checked before any element is handed out.
pub(crate) fn sequence_of<'a, F>(
	bytes: &'a [u8],
	tag: u32,
	compound: bool,
	mut element: F,
) -> Result<(), Asn1Error>
where
	F: FnMut(&mut Fields<'a>) -> Result<(), Asn1Error>,
{
	let mut offset = 0;
	let mut count = 0_usize;

	while offset < bytes.len() {
		let (mut header, next) = TagAndLength::parse(bytes, offset)?;

		// string and time types are interchangeable in collections
		header.tag = match header.tag {
			TAG_IA5_STRING | TAG_GENERAL_STRING | TAG_T61_STRING | TAG_UTF8_STRING
			| TAG_NUMERIC_STRING | TAG_BMP_STRING => TAG_PRINTABLE_STRING,
			TAG_GENERALIZED_TIME => TAG_UTC_TIME,
			tag => tag,
		};

		if header.class != CLASS_UNIVERSAL || header.is_compound != compound || header.tag != tag
		{
			return Err(StructuralError::new("sequence tag mismatch").into());
		}

		offset = next
			.checked_add(header.length)
			.filter(|end| *end <= bytes.len())
			.ok_or(SyntaxError::new("truncated sequence"))?;
		count += 1;
	}

	let mut fields = Fields::new(bytes);

	for _ in 0..count {
		element(&mut fields)?;
	}

	Ok(())
}
