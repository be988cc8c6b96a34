#![deny(unsafe_code)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Decoding PEM-armored X.509 certificates.
//!
//! [`get_cert`] takes raw bytes and returns either a [`Certificate`] or an
//! [`Error`] telling apart empty input, missing or broken PEM armor and DER
//! that isn't shaped like a certificate. The latter pinpoints the offending
//! element:
//!
//! ```text
//! asn1: structure error: tags don't match (6 vs {class:3 tag:22 length:3 isCompound:false}) {...} ObjectIdentifier @2
//! ```
//!
//! No validation beyond decoding is done: signatures, chains, expiry and
//! revocation are left to the caller.

pub mod asn1;
mod decoder;
pub mod error;
pub mod pem;
mod x509;

pub use decoder::{get_cert, Decoder};
pub use error::{Error, ErrorKind, Result};
pub use x509::{Attribute, Certificate, CertificateChain, DistinguishedName, Extension};
