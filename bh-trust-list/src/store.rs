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

use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use bherror::traits::{ErrorContext as _, ForeignError as _};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{serializer, Error, MergeCandidate, MergeOutcome, Result, TrustList, TrustListSchema};

/// Conventional location of the trust list, relative to the working directory.
pub const DEFAULT_TRUST_LIST_PATH: &str = "trust-list.json";

/// The trust list file.
///
/// Every write goes through the same gate: the canonical text is parsed back and compared with
/// the in-memory trust list, validated against the schema, and only then atomically moved into
/// place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustListStore {
    path: PathBuf,
}

impl TrustListStore {
    /// Creates a store for the file at `path`.  The file is not accessed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the trust list file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file as a generic JSON document, e.g. for schema validation.
    pub fn read_document(&self) -> Result<Value> {
        let content = self.read_to_string()?;

        serde_json::from_str(&content)
            .foreign_err(|| Error::RegistryRead)
            .ctx(|| format!("invalid JSON in {}", self.path.display()))
    }

    /// Reads and parses the trust list.
    pub fn load(&self) -> Result<TrustList> {
        let content = self.read_to_string()?;

        serializer::parse(&content).ctx(|| format!("trust list {}", self.path.display()))
    }

    /// Writes the trust list in its canonical form.
    ///
    /// Nothing is written unless the trust list passes the schema and its canonical text parses
    /// back into an identical trust list.
    pub fn save(&self, trust_list: &TrustList, schema: &TrustListSchema) -> Result<()> {
        let document = serializer::to_document(trust_list)?;

        let value: Value = serde_json::from_str(&document)
            .foreign_err(|| Error::RegistryWrite)
            .ctx(|| "canonical text is not valid JSON")?;
        schema.check(&value).ctx(|| "refusing to write the trust list")?;

        if serializer::parse(&document)? != *trust_list {
            return Err(bherror::Error::root(Error::RegistryWrite)
                .ctx("canonical text does not round-trip"));
        }
        trust_list.check_unique_issuer_ids()?;

        self.write_atomically(&document)?;

        let written = self.read_to_string().ctx(|| "cannot verify the written trust list")?;
        if written != document {
            return Err(bherror::Error::root(Error::RegistryWrite)
                .ctx(format!("{} changed while being written", self.path.display())));
        }

        tracing::info!(path = %self.path.display(), entries = trust_list.len(), "trust list saved");

        Ok(())
    }

    /// Merges the candidate into the stored trust list, see [`TrustList::merge`].
    ///
    /// The file is rewritten only if the merge changed the trust list.
    pub fn add_certificate(
        &self,
        candidate: MergeCandidate,
        schema: &TrustListSchema,
    ) -> Result<MergeOutcome> {
        let mut trust_list = self.load()?;
        let before = trust_list.clone();

        let outcome = trust_list.merge(candidate)?;

        if trust_list == before {
            tracing::debug!(%outcome, "trust list unchanged, nothing to write");
        } else {
            self.save(&trust_list, schema)?;
        }

        Ok(outcome)
    }

    fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .foreign_err(|| Error::RegistryRead)
            .ctx(|| format!("cannot read {}", self.path.display()))
    }

    fn write_atomically(&self, document: &str) -> Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(directory)
            .foreign_err(|| Error::RegistryWrite)
            .ctx(|| format!("cannot create a temporary file in {}", directory.display()))?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            file.as_file()
                .set_permissions(metadata.permissions())
                .foreign_err(|| Error::RegistryWrite)?;
        }

        file.write_all(document.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .foreign_err(|| Error::RegistryWrite)
            .ctx(|| "cannot write the temporary file")?;

        file.persist(&self.path)
            .map_err(|err| err.error)
            .foreign_err(|| Error::RegistryWrite)
            .ctx(|| format!("cannot replace {}", self.path.display()))?;

        Ok(())
    }
}
