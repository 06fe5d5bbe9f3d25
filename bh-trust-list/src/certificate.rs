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

use std::path::Path;

use bherror::traits::{ErrorContext as _, ForeignError as _};
use chrono::{DateTime, Utc};
use openssl::{
    asn1::{Asn1Time, Asn1TimeRef},
    nid::Nid,
    x509::{X509NameRef, X509},
};

use crate::{Error, Result};

/// The text marker which identifies PEM encoded certificate content.
pub const PEM_CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Encoding of the raw certificate bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CertificateEncoding {
    /// PEM text.
    Pem,
    /// Binary DER.
    Der,
    /// Either of the above; PEM is chosen when the text marker is present, DER otherwise.
    Sniff,
}

impl CertificateEncoding {
    /// Chooses the encoding from the file extension.
    ///
    /// Returns [`None`] for unknown extensions, whose content is accepted only when it turns out
    /// to be PEM.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "pem" => Some(Self::Pem),
            "cer" | "crt" | "der" => Some(Self::Sniff),
            _ => None,
        }
    }
}

/// Best-effort fields of the certificate Subject distinguished name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectFields {
    /// The `C` attribute.
    pub country: Option<String>,
    /// The `O` attribute.
    pub organization: Option<String>,
    /// The `CN` attribute.
    pub common_name: Option<String>,
}

impl SubjectFields {
    fn from_name(name: &X509NameRef) -> Self {
        Self {
            country: first_entry(name, Nid::COUNTRYNAME),
            organization: first_entry(name, Nid::ORGANIZATIONNAME),
            common_name: first_entry(name, Nid::COMMONNAME),
        }
    }

    /// Human-readable issuer name: the organization, falling back to the common name, falling
    /// back to an empty string.
    pub fn display_name(&self) -> &str {
        [&self.organization, &self.common_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
            .unwrap_or_default()
    }
}

fn first_entry(name: &X509NameRef, nid: Nid) -> Option<String> {
    let entry = name.entries_by_nid(nid).next()?;
    entry.data().to_string().ok()
}

/// Validity period of a certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    /// The `notBefore` time.
    pub not_before: DateTime<Utc>,
    /// The `notAfter` time.
    pub not_after: DateTime<Utc>,
}

impl Validity {
    fn from_certificate(certificate: &X509) -> Result<Self> {
        Ok(Self {
            not_before: asn1_time_to_utc(certificate.not_before()).ctx(|| "invalid notBefore")?,
            not_after: asn1_time_to_utc(certificate.not_after()).ctx(|| "invalid notAfter")?,
        })
    }

    /// Parses only the validity period out of a PEM encoded certificate.
    ///
    /// Unlike [`CertificateMetadata::parse`], this does not require the Subject Key Identifier.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let certificate = X509::from_pem(pem.as_bytes())
            .foreign_err(|| Error::UnparsableCertificate)
            .ctx(|| "invalid PEM certificate")?;

        Self::from_certificate(&certificate)
    }
}

/// Normalized record of the data this crate needs out of an X.509 certificate.
#[derive(Clone, Debug)]
pub struct CertificateMetadata {
    /// The Subject Key Identifier as colon-separated uppercase hex, e.g. `A1:B2:C3`.
    pub ski: String,
    /// Subject fields.
    pub subject: SubjectFields,
    /// Certificate PEM text, see [`normalize_pem`].
    pub pem: String,
    /// Validity period.
    pub validity: Validity,
    certificate: X509,
}

impl CertificateMetadata {
    /// Reads the certificate file and extracts its metadata.
    ///
    /// The encoding is chosen by [`CertificateEncoding::from_path`].  Files with an unknown
    /// extension are accepted only if they contain PEM text, otherwise
    /// [`Error::UnsupportedFileFormat`] is returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let bytes = std::fs::read(path)
            .foreign_err(|| Error::CertificateRead)
            .ctx(|| path.display().to_string())?;

        let encoding = match CertificateEncoding::from_path(path) {
            Some(encoding) => encoding,
            None if contains_pem_marker(&bytes) => CertificateEncoding::Pem,
            None => {
                let extension = path
                    .extension()
                    .map(|extension| extension.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Err(bherror::Error::root(Error::UnsupportedFileFormat(extension))
                    .ctx(path.display().to_string()));
            }
        };

        tracing::debug!(path = %path.display(), ?encoding, "parsing certificate file");

        Self::parse(&bytes, encoding).ctx(|| path.display().to_string())
    }

    /// Parses the raw certificate bytes of the given encoding.
    ///
    /// PEM input is stored as given (after [`normalize_pem`]), while DER input is re-encoded to
    /// PEM.
    pub fn parse(bytes: &[u8], encoding: CertificateEncoding) -> Result<Self> {
        let encoding = match encoding {
            CertificateEncoding::Sniff if contains_pem_marker(bytes) => CertificateEncoding::Pem,
            CertificateEncoding::Sniff => CertificateEncoding::Der,
            encoding => encoding,
        };

        let (certificate, pem) = match encoding {
            CertificateEncoding::Der => {
                let certificate = X509::from_der(bytes)
                    .foreign_err(|| Error::UnparsableCertificate)
                    .ctx(|| "invalid DER certificate")?;
                let pem = certificate
                    .to_pem()
                    .foreign_err(|| Error::UnparsableCertificate)
                    .ctx(|| "cannot re-encode DER certificate to PEM")?;
                let pem = String::from_utf8(pem).foreign_err(|| Error::UnparsableCertificate)?;
                (certificate, pem)
            }
            _ => {
                let pem = std::str::from_utf8(bytes)
                    .foreign_err(|| Error::UnparsableCertificate)
                    .ctx(|| "PEM certificate is not valid UTF-8")?;
                let certificate = X509::from_pem(bytes)
                    .foreign_err(|| Error::UnparsableCertificate)
                    .ctx(|| "invalid PEM certificate")?;
                (certificate, pem.to_owned())
            }
        };

        let ski = certificate
            .subject_key_id()
            .map(|ski| format_ski(ski.as_slice()))
            .ok_or_else(|| bherror::Error::root(Error::MissingSubjectKeyIdentifier))?;

        Ok(Self {
            ski,
            subject: SubjectFields::from_name(certificate.subject_name()),
            pem: normalize_pem(&pem),
            validity: Validity::from_certificate(&certificate)?,
            certificate,
        })
    }

    /// Returns the parsed certificate.
    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// Renders the human-readable text dump of the certificate.
    pub fn to_text(&self) -> Result<String> {
        let text = self
            .certificate
            .to_text()
            .foreign_err(|| Error::UnparsableCertificate)?;

        String::from_utf8(text).foreign_err(|| Error::UnparsableCertificate)
    }
}

/// Normalizes the PEM text for storage: line endings become `\n` and a single trailing newline is
/// removed.
pub fn normalize_pem(pem: &str) -> String {
    let pem = pem.replace("\r\n", "\n");

    match pem.strip_suffix('\n') {
        Some(stripped) => stripped.to_owned(),
        None => pem,
    }
}

/// Formats the raw Subject Key Identifier the way `openssl x509 -text` prints it.
fn format_ski(ski: &[u8]) -> String {
    ski.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn contains_pem_marker(bytes: &[u8]) -> bool {
    bytes
        .windows(PEM_CERTIFICATE_MARKER.len())
        .any(|window| window == PEM_CERTIFICATE_MARKER.as_bytes())
}

/// Converts the ASN.1 time to [`DateTime<Utc>`] by measuring its distance from the Unix epoch.
fn asn1_time_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0).foreign_err(|| Error::UnparsableCertificate)?;
    let diff = epoch
        .diff(time)
        .foreign_err(|| Error::UnparsableCertificate)?;

    let seconds = i64::from(diff.days) * SECONDS_PER_DAY + i64::from(diff.secs);

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        bherror::Error::root(Error::UnparsableCertificate)
            .ctx(format!("{seconds} seconds out of range"))
    })
}
