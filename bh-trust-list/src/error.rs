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

use crate::SchemaViolations;

/// Error returned by the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// The Subject Key Identifier is not a valid hex string.
    #[strum(to_string = "Malformed Subject Key Identifier \"{0}\"")]
    MalformedIdentifier(String),
    /// The input is neither a valid PEM nor a valid DER encoded X.509 certificate.
    #[strum(to_string = "Unable to parse the X.509 certificate")]
    UnparsableCertificate,
    /// The certificate does not carry the Subject Key Identifier extension.
    #[strum(to_string = "Subject Key Identifier not found in certificate")]
    MissingSubjectKeyIdentifier,
    /// The certificate file could not be read.
    #[strum(to_string = "Unable to read the certificate file")]
    CertificateRead,
    /// The file extension is unknown and the content is not PEM.
    #[strum(
        to_string = "Unsupported certificate format \"{0}\", please use .pem, .cer, .crt or .der files"
    )]
    UnsupportedFileFormat(String),
    /// The trust list is missing or is not a valid JSON document.
    #[strum(to_string = "Unable to read the trust list")]
    RegistryRead,
    /// The trust list could not be serialized or persisted.
    #[strum(to_string = "Unable to write the trust list")]
    RegistryWrite,
    /// The trust list does not conform to the schema.
    #[strum(to_string = "Trust list does not conform to the schema: {0}")]
    SchemaValidation(SchemaViolations),
    /// The schema document itself is unusable.
    #[strum(to_string = "Invalid trust list schema")]
    InvalidSchema,
    /// Two entries share the same issuer identifier.
    #[strum(to_string = "Duplicate issuer_id \"{0}\"")]
    DuplicateIssuerId(String),
}

impl bherror::BhError for Error {}

/// The [`bherror::Result`] type with the error type of
/// [`bh_trust_list::Error`](Error), used throughout this crate.
pub type Result<T> = bherror::Result<T, Error>;
