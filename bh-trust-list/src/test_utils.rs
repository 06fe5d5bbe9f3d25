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

//! Helpers for tests: issuing self-signed certificates with a chosen subject, key and validity
//! period, so tests never depend on fixture files or the current date.
//!
//! Do NOT use this module for production code, but only tests.

use chrono::{DateTime, Duration, Utc};
use openssl::{
    asn1::{Asn1Integer, Asn1Time},
    bn::BigNum,
    ec::{EcGroup, EcKey},
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    x509::{
        extension::{BasicConstraints, KeyUsage, SubjectKeyIdentifier},
        X509NameBuilder, X509,
    },
};
use rand::RngCore as _;

/// X.509v3
const VERSION: i32 = 2;

/// Length of the certificate serial number in bytes.
const SERIAL_NUMBER_BYTES: usize = 16;

/// Subject and validity of a certificate issued by the [`CertificateFactory`].
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    country: Option<String>,
    organization: Option<String>,
    common_name: Option<String>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    subject_key_identifier: bool,
}

impl Default for CertificateTemplate {
    fn default() -> Self {
        let now = Utc::now();

        Self {
            country: Some("HR".to_owned()),
            organization: Some("TBTL".to_owned()),
            common_name: Some("Test Issuer".to_owned()),
            not_before: now - Duration::days(1),
            not_after: now + Duration::days(365),
            subject_key_identifier: true,
        }
    }
}

impl CertificateTemplate {
    /// Sets the `C` subject attribute.
    pub fn country(mut self, country: Option<&str>) -> Self {
        self.country = country.map(ToOwned::to_owned);
        self
    }

    /// Sets the `O` subject attribute.
    pub fn organization(mut self, organization: Option<&str>) -> Self {
        self.organization = organization.map(ToOwned::to_owned);
        self
    }

    /// Sets the `CN` subject attribute.
    pub fn common_name(mut self, common_name: Option<&str>) -> Self {
        self.common_name = common_name.map(ToOwned::to_owned);
        self
    }

    /// Sets the `notBefore` time.
    pub fn valid_from(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self
    }

    /// Sets the `notAfter` time.
    pub fn valid_until(mut self, not_after: DateTime<Utc>) -> Self {
        self.not_after = not_after;
        self.not_before = self.not_before.min(not_after);
        self
    }

    /// Omits the Subject Key Identifier extension.
    pub fn without_subject_key_identifier(mut self) -> Self {
        self.subject_key_identifier = false;
        self
    }
}

/// Issues self-signed certificates for a single P-256 key.
///
/// All certificates issued by the same factory share the public key, hence the Subject Key
/// Identifier, while their serial numbers differ.
#[derive(Clone)]
pub struct CertificateFactory {
    private_key: PKey<Private>,
}

impl Default for CertificateFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateFactory {
    /// Creates a factory with a freshly generated key.
    pub fn new() -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec_key = EcKey::generate(&group).unwrap();

        Self {
            private_key: PKey::from_ec_key(ec_key).unwrap(),
        }
    }

    /// Issues a certificate according to the `template`.
    pub fn issue(&self, template: &CertificateTemplate) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        for (field, value) in [
            ("C", &template.country),
            ("O", &template.organization),
            ("CN", &template.common_name),
        ] {
            if let Some(value) = value {
                name.append_entry_by_text(field, value).unwrap();
            }
        }
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(VERSION).unwrap();
        builder.set_serial_number(&random_serial_number()).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&self.private_key).unwrap();

        let not_before = Asn1Time::from_unix(template.not_before.timestamp()).unwrap();
        builder.set_not_before(&not_before).unwrap();
        let not_after = Asn1Time::from_unix(template.not_after.timestamp()).unwrap();
        builder.set_not_after(&not_after).unwrap();

        let basic_constraints = BasicConstraints::new().critical().ca().build().unwrap();
        builder.append_extension(basic_constraints).unwrap();

        let key_usage = KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()
            .unwrap();
        builder.append_extension(key_usage).unwrap();

        if template.subject_key_identifier {
            let subject_key_identifier = SubjectKeyIdentifier::new()
                .build(&builder.x509v3_context(None, None))
                .unwrap();
            builder.append_extension(subject_key_identifier).unwrap();
        }

        builder
            .sign(&self.private_key, MessageDigest::sha256())
            .unwrap();

        builder.build()
    }

    /// Issues a certificate and returns it as PEM text without the trailing newline, i.e. in the
    /// form it is stored in the trust list.
    pub fn issue_pem(&self, template: &CertificateTemplate) -> String {
        to_pem(&self.issue(template))
    }
}

/// Encodes the certificate as PEM text without the trailing newline.
pub fn to_pem(certificate: &X509) -> String {
    let pem = String::from_utf8(certificate.to_pem().unwrap()).unwrap();
    crate::normalize_pem(&pem)
}

/// Positive, nonzero random serial number.
fn random_serial_number() -> Asn1Integer {
    let mut serial_number = [0u8; SERIAL_NUMBER_BYTES];
    rand::rng().fill_bytes(&mut serial_number);
    // Must be positive
    serial_number[0] &= 0x7f;
    // Must be nonzero
    serial_number[SERIAL_NUMBER_BYTES - 1] |= 0x01;

    BigNum::from_slice(&serial_number)
        .unwrap()
        .to_asn1_integer()
        .unwrap()
}
