// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides functions and types for maintaining a trust list: a curated registry of
//! trusted X.509 certificate issuers, persisted as a single JSON document.
//!
//! # Details
//!
//! Every issuer in the [`TrustList`] is identified by an [`IssuerId`] derived from the Subject Key
//! Identifier (SKI) of its certificates, in the form `x509_aki:<base64url>`.
//!
//! The primary operations are:
//!
//! * [`CertificateMetadata`] extracts the SKI, subject, validity period and normalized PEM text
//!   out of a PEM or DER encoded certificate.
//! * [`TrustList::merge`] inserts a [`MergeCandidate`] into the registry with idempotent,
//!   rotation-aware semantics, reporting a [`MergeOutcome`].
//! * [`TrustListStore`] reads and atomically rewrites the registry file in its canonical form,
//!   gated by the [`TrustListSchema`].
//! * [`evaluate`] classifies every certificate against an [`ExpirationPolicy`] and returns an
//!   [`ExpirationReport`].
//!
//! # Examples
//!
//! ```no_run
//! use bh_trust_list::{
//!     CertificateMetadata, EntryDefaults, MergeCandidate, TrustListSchema, TrustListStore,
//! };
//!
//! let metadata = CertificateMetadata::from_file("issuer.crt").expect("valid certificate");
//! let candidate = MergeCandidate::from_metadata(&metadata, &EntryDefaults::default())
//!     .expect("certificate has a valid SKI");
//!
//! let schema = TrustListSchema::bundled().expect("bundled schema compiles");
//! let store = TrustListStore::new("trust-list.json");
//!
//! let outcome = store
//!     .add_certificate(candidate, &schema)
//!     .expect("trust list updated");
//! println!("{outcome}");
//! ```

mod certificate;
mod error;
mod expiration;
mod identifier;
mod merge;
mod models;
mod schema;
pub mod serializer;
mod store;

#[cfg(any(feature = "test-utils", test))]
pub mod test_utils;

pub use certificate::*;
pub use error::*;
pub use expiration::*;
pub use identifier::*;
pub use merge::*;
pub use models::*;
pub use schema::*;
pub use store::*;
