//! X509 public key certificate handling.

mod certificate;
mod certificate_chain;
mod name;

pub use certificate::{Certificate, Extension};
pub use certificate_chain::CertificateChain;
pub use name::{Attribute, DistinguishedName};
