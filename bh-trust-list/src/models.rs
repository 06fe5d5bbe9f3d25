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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, IssuerId, Result};

/// Default classification of newly created trust list entries.
pub const DEFAULT_ENTITY_TYPE: &str = "government";

/// Storage format of a [`CertificateRecord`].
///
/// The trust list only ever stores PEM; DER input is converted before storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateFormat {
    /// PEM text.
    #[default]
    Pem,
}

/// A single certificate of a trusted issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Certificate PEM text, normalized by [`normalize_pem`][crate::normalize_pem].
    pub certificate: String,
    /// Storage format, always [`CertificateFormat::Pem`].
    pub certificate_format: CertificateFormat,
    /// Free-form provenance of the certificate.
    pub source: String,
    /// Exempts this certificate from expiration checks.
    ///
    /// Kept as an [`Option`] so that an explicit `false` survives a rewrite of the trust list.
    #[serde(
        rename = "allowExpired",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_expired: Option<bool>,
    /// Any other keys of the record, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CertificateRecord {
    /// Creates a PEM record with the given provenance.
    pub fn new(pem: String, source: String) -> Self {
        Self {
            certificate: pem,
            certificate_format: CertificateFormat::Pem,
            source,
            allow_expired: None,
            extra: Map::new(),
        }
    }

    /// Whether the record is exempt from expiration checks.
    pub fn allows_expired(&self) -> bool {
        self.allow_expired.unwrap_or(false)
    }
}

/// A trusted issuer and its certificates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustListEntry {
    /// Stable identifier, derived from the Subject Key Identifier of the first certificate.
    pub issuer_id: IssuerId,
    /// Classification of the issuer, e.g. `government`.
    pub entity_type: String,
    /// Human-readable label taken from the most recently merged certificate.
    pub name: String,
    /// Certificates in insertion order.
    pub certificates: Vec<CertificateRecord>,
    /// Any other keys of the entry, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The registry of trusted issuers.
///
/// Entries keep their insertion order, new entries are always appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustList(pub(crate) Vec<TrustListEntry>);

impl TrustList {
    /// Creates an empty [`TrustList`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries in their stored order.
    pub fn entries(&self) -> &[TrustListEntry] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds the entry with the given identifier.
    pub fn find(&self, issuer_id: &IssuerId) -> Option<&TrustListEntry> {
        self.0.iter().find(|entry| &entry.issuer_id == issuer_id)
    }

    /// Returns `(index, first_index)` pairs of entries whose `issuer_id` already appeared at
    /// `first_index`.
    pub fn duplicate_issuer_ids(&self) -> Vec<(usize, usize)> {
        let mut first_seen = HashMap::new();

        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let first_index = *first_seen.entry(&entry.issuer_id).or_insert(index);
                (first_index != index).then_some((index, first_index))
            })
            .collect()
    }

    /// Checks that every `issuer_id` is unique.
    pub fn check_unique_issuer_ids(&self) -> Result<()> {
        match self.duplicate_issuer_ids().first() {
            None => Ok(()),
            Some(&(index, first_index)) => {
                let issuer_id = self.0[index].issuer_id.to_string();
                Err(bherror::Error::root(Error::DuplicateIssuerId(issuer_id))
                    .ctx(format!("entries {first_index} and {index}")))
            }
        }
    }
}

impl From<Vec<TrustListEntry>> for TrustList {
    fn from(entries: Vec<TrustListEntry>) -> Self {
        Self(entries)
    }
}

impl From<TrustList> for Vec<TrustListEntry> {
    fn from(trust_list: TrustList) -> Self {
        trust_list.0
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn entry(issuer_id: &str) -> TrustListEntry {
        TrustListEntry {
            issuer_id: serde_json::from_value(json!(issuer_id)).unwrap(),
            entity_type: DEFAULT_ENTITY_TYPE.to_owned(),
            name: "Issuer".to_owned(),
            certificates: vec![CertificateRecord::new("pem".to_owned(), String::new())],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_record_serialization() {
        let mut record = CertificateRecord::new("pem".to_owned(), "manual".to_owned());

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"certificate": "pem", "certificate_format": "pem", "source": "manual"})
        );

        record.allow_expired = Some(false);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "certificate": "pem",
                "certificate_format": "pem",
                "source": "manual",
                "allowExpired": false,
            })
        );
        assert!(!record.allows_expired());

        let record: CertificateRecord = serde_json::from_value(json!({
            "certificate": "pem",
            "certificate_format": "pem",
            "source": "",
            "allowExpired": true,
        }))
        .unwrap();
        assert!(record.allows_expired());
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let document = json!({
            "issuer_id": "x509_aki:AA",
            "entity_type": "government",
            "name": "Issuer",
            "country": "HR",
            "certificates": [
                {
                    "certificate": "pem",
                    "certificate_format": "pem",
                    "source": "",
                    "note": "keep me",
                }
            ],
        });

        let entry: TrustListEntry = serde_json::from_value(document.clone()).unwrap();
        assert_eq!(entry.extra.get("country"), Some(&json!("HR")));
        assert_eq!(
            entry.certificates[0].extra.get("note"),
            Some(&json!("keep me"))
        );
        assert!(!entry.certificates[0].extra.contains_key("allowExpired"));

        assert_eq!(serde_json::to_value(&entry).unwrap(), document);
    }

    #[test]
    fn test_record_rejects_unknown_format() {
        let result = serde_json::from_value::<CertificateRecord>(json!({
            "certificate": "der bytes",
            "certificate_format": "der",
            "source": "",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_find() {
        let trust_list = TrustList::from(vec![entry("x509_aki:AA"), entry("x509_aki:BB")]);

        let issuer_id = IssuerId::from_ski_bytes(&[0x04, 0x10]);
        assert_eq!(issuer_id.as_str(), "x509_aki:BBA");
        assert!(trust_list.find(&issuer_id).is_none());

        let found = trust_list
            .find(&serde_json::from_value(json!("x509_aki:BB")).unwrap())
            .unwrap();
        assert_eq!(found, &trust_list.entries()[1]);
    }

    #[test]
    fn test_duplicate_issuer_ids() {
        let trust_list = TrustList::from(vec![
            entry("x509_aki:AA"),
            entry("x509_aki:BB"),
            entry("x509_aki:AA"),
            entry("x509_aki:AA"),
        ]);

        assert_eq!(trust_list.duplicate_issuer_ids(), vec![(2, 0), (3, 0)]);

        let err = trust_list.check_unique_issuer_ids().unwrap_err();
        assert_matches!(err.error, Error::DuplicateIssuerId(ref id) if id == "x509_aki:AA");

        let trust_list = TrustList::from(vec![entry("x509_aki:AA"), entry("x509_aki:BB")]);
        assert!(trust_list.duplicate_issuer_ids().is_empty());
        trust_list.check_unique_issuer_ids().unwrap();
    }
}
