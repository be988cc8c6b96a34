//! [`DistinguishedName`].

use std::{
	fmt::{self, Display, Formatter, Write},
	slice::Iter,
};

use serde::{Deserialize, Serialize};
use x509_parser::x509::X509Name;

const COMMON_NAME: &str = "2.5.4.3";
const COUNTRY: &str = "2.5.4.6";
const LOCALITY: &str = "2.5.4.7";
const STATE_OR_PROVINCE: &str = "2.5.4.8";
const ORGANIZATION: &str = "2.5.4.10";
const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";

/// Short names used when displaying attributes.
const SHORT_NAMES: &[(&str, &str)] = &[
	(COMMON_NAME, "CN"),
	("2.5.4.5", "serialNumber"),
	(COUNTRY, "C"),
	(LOCALITY, "L"),
	(STATE_OR_PROVINCE, "ST"),
	("2.5.4.9", "street"),
	(ORGANIZATION, "O"),
	(ORGANIZATIONAL_UNIT, "OU"),
	("2.5.4.15", "businessCategory"),
	("2.5.4.17", "postalCode"),
	("0.9.2342.19200300.100.1.25", "DC"),
	("1.2.840.113549.1.9.1", "emailAddress"),
];

/// A single attribute of a [`DistinguishedName`].
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Attribute {
	/// Dotted object identifier of the attribute type.
	oid: String,
	/// The value, `#` followed by hex digits if it isn't a string.
	value: String,
}

impl Attribute {
	/// Dotted object identifier of the attribute type, e.g. `2.5.4.3`.
	#[must_use]
	pub fn oid(&self) -> &str {
		&self.oid
	}

	/// Well-known short name of the attribute type, e.g. `CN`.
	#[must_use]
	pub fn short_name(&self) -> Option<&'static str> {
		SHORT_NAMES
			.iter()
			.find(|(oid, _)| *oid == self.oid)
			.map(|(_, name)| *name)
	}

	/// The value of this [`Attribute`].
	#[must_use]
	pub fn value(&self) -> &str {
		&self.value
	}
}

impl Display for Attribute {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}={}",
			self.short_name().unwrap_or(self.oid.as_str()),
			self.value
		)
	}
}

/// The issuer or subject of a [`Certificate`](crate::Certificate), attributes
/// are kept in encoding order.
#[derive(
	Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct DistinguishedName(Vec<Attribute>);

impl DistinguishedName {
	pub(crate) fn from_x509(name: &X509Name<'_>) -> Self {
		Self(
			name.iter_attributes()
				.map(|attribute| Attribute {
					oid: attribute.attr_type().to_id_string(),
					value: attribute.as_str().map_or_else(
						|_| {
							attribute.attr_value().data.iter().fold(
								String::from("#"),
								|mut hex, byte| {
									let _ = write!(hex, "{byte:02x}");
									hex
								},
							)
						},
						ToOwned::to_owned,
					),
				})
				.collect(),
		)
	}

	/// Returns an iterator over all [`Attribute`]s.
	pub fn iter(&self) -> Iter<'_, Attribute> {
		self.0.iter()
	}

	/// Returns `true` if there are no [`Attribute`]s.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the first value of the attribute with the given dotted object
	/// identifier.
	#[must_use]
	pub fn get(&self, oid: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|attribute| attribute.oid == oid)
			.map(Attribute::value)
	}

	/// Common name (`CN`).
	#[must_use]
	pub fn common_name(&self) -> Option<&str> {
		self.get(COMMON_NAME)
	}

	/// Country (`C`).
	#[must_use]
	pub fn country(&self) -> Option<&str> {
		self.get(COUNTRY)
	}

	/// State or province (`ST`).
	#[must_use]
	pub fn state_or_province(&self) -> Option<&str> {
		self.get(STATE_OR_PROVINCE)
	}

	/// Locality (`L`).
	#[must_use]
	pub fn locality(&self) -> Option<&str> {
		self.get(LOCALITY)
	}

	/// Organization (`O`).
	#[must_use]
	pub fn organization(&self) -> Option<&str> {
		self.get(ORGANIZATION)
	}

	/// Organizational unit (`OU`).
	#[must_use]
	pub fn organizational_unit(&self) -> Option<&str> {
		self.get(ORGANIZATIONAL_UNIT)
	}
}

impl<'a> IntoIterator for &'a DistinguishedName {
	type IntoIter = Iter<'a, Attribute>;
	type Item = &'a Attribute;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl Display for DistinguishedName {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (index, attribute) in self.0.iter().enumerate() {
			if index != 0 {
				f.write_str(", ")?;
			}

			attribute.fmt(f)?;
		}

		Ok(())
	}
}

#[test]
fn display() {
	let name = DistinguishedName(vec![
		Attribute {
			oid: String::from(COUNTRY),
			value: String::from("US"),
		},
		Attribute {
			oid: String::from("1.3.6.1.4.1.311.60.2.1.3"),
			value: String::from("US"),
		},
		Attribute {
			oid: String::from(COMMON_NAME),
			value: String::from("test"),
		},
	]);

	assert_eq!(name.to_string(), "C=US, 1.3.6.1.4.1.311.60.2.1.3=US, CN=test");
	assert_eq!(name.common_name(), Some("test"));
	assert_eq!(name.country(), Some("US"));
	assert_eq!(name.organization(), None);
	assert_eq!(name.iter().count(), 3);
	assert!(DistinguishedName::default().is_empty());
}
