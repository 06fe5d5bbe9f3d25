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

use bherror::traits::ErrorContext as _;
use serde_json::Map;

use crate::{
    CertificateEncoding, CertificateMetadata, CertificateRecord, IssuerId, Result, TrustList,
    TrustListEntry, DEFAULT_ENTITY_TYPE,
};

/// Result of [`TrustList::merge`].
#[derive(strum_macros::Display, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new entry was appended to the trust list.
    #[strum(to_string = "Entry added")]
    Added,
    /// The certificate was appended to an existing entry.
    #[strum(to_string = "Certificate added to entry")]
    CertificateAdded,
    /// A certificate with the same Subject Key Identifier was replaced.
    #[strum(to_string = "Certificate updated for entry")]
    CertificateUpdated,
    /// The exact certificate was already present.
    #[strum(to_string = "Certificate already exists for entry")]
    AlreadyExists,
}

/// Values used for the fields which are not derived from the certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDefaults {
    /// The `entity_type` of a newly created entry.
    pub entity_type: String,
    /// The `source` of the new certificate record.
    pub source: String,
}

impl Default for EntryDefaults {
    fn default() -> Self {
        Self {
            entity_type: DEFAULT_ENTITY_TYPE.to_owned(),
            source: String::new(),
        }
    }
}

/// A certificate prepared for merging into the [`TrustList`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeCandidate {
    issuer_id: IssuerId,
    ski: String,
    name: String,
    entity_type: String,
    record: CertificateRecord,
}

impl MergeCandidate {
    /// Prepares the certificate for merging, deriving its [`IssuerId`].
    pub fn from_metadata(metadata: &CertificateMetadata, defaults: &EntryDefaults) -> Result<Self> {
        Ok(Self {
            issuer_id: IssuerId::from_ski(&metadata.ski)?,
            ski: metadata.ski.clone(),
            name: metadata.subject.display_name().to_owned(),
            entity_type: defaults.entity_type.clone(),
            record: CertificateRecord::new(metadata.pem.clone(), defaults.source.clone()),
        })
    }

    /// The identifier of the issuer.
    pub fn issuer_id(&self) -> &IssuerId {
        &self.issuer_id
    }

    /// The single-certificate entry this candidate would create.
    pub fn to_entry(&self) -> TrustListEntry {
        TrustListEntry {
            issuer_id: self.issuer_id.clone(),
            entity_type: self.entity_type.clone(),
            name: self.name.clone(),
            certificates: vec![self.record.clone()],
            extra: Map::new(),
        }
    }
}

impl TrustList {
    /// Merges a single certificate into the trust list.
    ///
    /// If there is no entry for the candidate's [`IssuerId`], a new entry is appended.
    /// Otherwise, the certificates of the entry are scanned in order:
    ///
    /// * an identical PEM means the certificate already exists;
    /// * a certificate with the same Subject Key Identifier is replaced in place (rotation);
    /// * if neither is found, the certificate is appended to the entry.
    ///
    /// The entry name is always overwritten with the candidate's name.
    ///
    /// An existing certificate whose Subject Key Identifier cannot be extracted aborts the merge
    /// and leaves the trust list untouched.
    pub fn merge(&mut self, candidate: MergeCandidate) -> Result<MergeOutcome> {
        let Some(index) = self
            .0
            .iter()
            .position(|entry| entry.issuer_id == candidate.issuer_id)
        else {
            tracing::debug!(issuer_id = %candidate.issuer_id, "appending new entry");
            self.0.push(candidate.to_entry());
            return Ok(MergeOutcome::Added);
        };

        let MergeCandidate {
            ski, name, record, ..
        } = candidate;

        let entry = &mut self.0[index];
        let outcome = merge_record(entry, &ski, record)?;
        tracing::debug!(issuer_id = %entry.issuer_id, %outcome, "merged certificate");

        entry.name = name;

        Ok(outcome)
    }
}

fn merge_record(
    entry: &mut TrustListEntry,
    ski: &str,
    record: CertificateRecord,
) -> Result<MergeOutcome> {
    let issuer_id = &entry.issuer_id;

    for (index, existing) in entry.certificates.iter_mut().enumerate() {
        if existing.certificate == record.certificate {
            return Ok(MergeOutcome::AlreadyExists);
        }

        let existing_ski =
            CertificateMetadata::parse(existing.certificate.as_bytes(), CertificateEncoding::Pem)
                .ctx(|| format!("certificate {} of issuer {issuer_id}", index + 1))?
                .ski;

        if existing_ski == ski {
            existing.certificate = record.certificate;
            return Ok(MergeOutcome::CertificateUpdated);
        }
    }

    entry.certificates.push(record);

    Ok(MergeOutcome::CertificateAdded)
}
