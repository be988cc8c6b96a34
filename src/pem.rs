//! PEM armor, see [RFC 7468](https://www.rfc-editor.org/rfc/rfc7468).

use base64::{
	alphabet,
	engine::{GeneralPurpose, GeneralPurposeConfig},
	Engine,
};

/// Start of the line opening a block.
const BEGIN: &[u8] = b"-----BEGIN ";
/// Start of the line closing a block.
const END: &[u8] = b"-----END ";
/// Closes the label on both the opening and the closing line.
const DASHES: &[u8] = b"-----";

/// Standard alphabet with mandatory padding. Non-zero trailing bits are
/// tolerated, plenty of encoders in the wild emit them.
const PEM_BASE64: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// A single decoded PEM block.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Block {
	/// Label of the `BEGIN` and `END` lines, e.g. `CERTIFICATE`.
	label: String,
	/// `Key: value` lines preceding the base64 body.
	headers: Vec<(String, String)>,
	/// Decoded body.
	contents: Vec<u8>,
}

impl Block {
	/// Searches `input` for the first decodable [`Block`]. Returns it together
	/// with the input following its `END` line.
	///
	/// Anything that looks like a block but fails to decode is skipped and
	/// the search resumes right after its `BEGIN` marker.
	#[must_use]
	pub fn decode(input: &[u8]) -> Option<(Self, &[u8])> {
		let mut rest = input;

		loop {
			let start = find_begin(rest)?;
			rest = &rest[start..];

			if let Some(found) = Self::decode_armored(rest) {
				return Some(found);
			}

			tracing::trace!("skipping malformed PEM block");
		}
	}

	/// Decodes a block from `input` starting right after `-----BEGIN `.
	fn decode_armored(input: &[u8]) -> Option<(Self, &[u8])> {
		let (line, mut rest) = split_line(input);
		let label = trim_end(line).strip_suffix(DASHES)?;
		let label = std::str::from_utf8(label).ok()?;

		let mut headers = Vec::new();

		loop {
			if rest.is_empty() {
				return None;
			}

			let (line, next) = split_line(rest);
			let Some(colon) = line.iter().position(|byte| *byte == b':') else {
				break;
			};

			let key = std::str::from_utf8(trim(&line[..colon])).ok()?;
			let value = std::str::from_utf8(trim(&line[colon + 1..])).ok()?;
			headers.push((key.to_owned(), value.to_owned()));
			rest = next;
		}

		let (body, after_end) = if let Some(after_end) = rest.strip_prefix(END) {
			(&rest[..0], after_end)
		} else {
			let index = find(rest, b"\n-----END ")?;
			(&rest[..index], &rest[index + 1 + END.len()..])
		};

		let after_label = after_end
			.strip_prefix(label.as_bytes())?
			.strip_prefix(DASHES)?;
		let (tail, remaining) = split_line(after_label);

		if !trim_end(tail).is_empty() {
			return None;
		}

		let encoded: Vec<u8> = body
			.iter()
			.copied()
			.filter(|byte| !byte.is_ascii_whitespace())
			.collect();
		let contents = PEM_BASE64.decode(encoded).ok()?;

		Some((
			Self {
				label: label.to_owned(),
				headers,
				contents,
			},
			remaining,
		))
	}

	/// Label of this [`Block`], e.g. `CERTIFICATE`.
	#[must_use]
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Headers of this [`Block`], in the order they appeared.
	#[must_use]
	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	/// Decoded body of this [`Block`].
	#[must_use]
	pub fn contents(&self) -> &[u8] {
		&self.contents
	}

	/// Destructure [`Block`] into its decoded body.
	#[must_use]
	#[allow(clippy::missing_const_for_fn)]
	pub fn into_contents(self) -> Vec<u8> {
		self.contents
	}
}

/// Iterator over every decodable [`Block`] in some input, see [`blocks`].
#[derive(Clone, Debug)]
pub struct Blocks<'a> {
	/// Input not searched yet.
	rest: &'a [u8],
}

impl Iterator for Blocks<'_> {
	type Item = Block;

	fn next(&mut self) -> Option<Self::Item> {
		let (block, rest) = Block::decode(self.rest)?;
		self.rest = rest;
		Some(block)
	}
}

/// Returns an iterator over every decodable [`Block`] in `input`.
#[must_use]
pub const fn blocks(input: &[u8]) -> Blocks<'_> {
	Blocks { rest: input }
}

/// Returns the position right after the next `-----BEGIN ` found at the start
/// of `input` or at the start of a line.
fn find_begin(input: &[u8]) -> Option<usize> {
	if input.starts_with(BEGIN) {
		Some(BEGIN.len())
	} else {
		find(input, b"\n-----BEGIN ").map(|index| index + 1 + BEGIN.len())
	}
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}

/// Splits off the first line, the newline itself belongs to neither half.
fn split_line(input: &[u8]) -> (&[u8], &[u8]) {
	match input.iter().position(|byte| *byte == b'\n') {
		Some(index) => (&input[..index], &input[index + 1..]),
		None => (input, &input[input.len()..]),
	}
}

const fn is_blank(byte: u8) -> bool {
	matches!(byte, b' ' | b'\t' | b'\r')
}

fn trim_end(mut line: &[u8]) -> &[u8] {
	while let [rest @ .., last] = line {
		if !is_blank(*last) {
			break;
		}
		line = rest;
	}

	line
}

fn trim(mut line: &[u8]) -> &[u8] {
	while let [first, rest @ ..] = line {
		if !is_blank(*first) {
			break;
		}
		line = rest;
	}

	trim_end(line)
}
