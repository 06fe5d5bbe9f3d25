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

use std::{collections::HashMap, fmt, path::Path};

use bherror::traits::{ErrorContext as _, ForeignError as _};
use serde_json::Value;

use crate::{Error, Result};

/// Conventional location of the schema, relative to the working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "trust-list.schema.json";

/// The JSON Schema (draft 2020-12) of the trust list shipped with the crate.
pub const BUNDLED_SCHEMA: &str = include_str!("../schema/trust-list.schema.json");

/// A single schema violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer to the offending value, `/` for the document root.
    pub path: String,
    /// Human readable description of the violation.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All the violations found in a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Compiled trust list schema.
pub struct TrustListSchema {
    validator: jsonschema::Validator,
}

impl fmt::Debug for TrustListSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustListSchema").finish_non_exhaustive()
    }
}

impl TrustListSchema {
    /// Compiles the given schema document.
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::draft202012::new(schema).map_err(|err| {
            bherror::Error::root(Error::InvalidSchema).ctx(format!("cannot compile schema: {err}"))
        })?;

        Ok(Self { validator })
    }

    /// Compiles the schema from its JSON text.
    pub fn from_json_str(schema: &str) -> Result<Self> {
        let schema: Value = serde_json::from_str(schema)
            .foreign_err(|| Error::InvalidSchema)
            .ctx(|| "schema is not valid JSON")?;

        Self::new(&schema)
    }

    /// Reads and compiles the schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let schema = std::fs::read_to_string(path)
            .foreign_err(|| Error::InvalidSchema)
            .ctx(|| format!("cannot read {}", path.display()))?;

        Self::from_json_str(&schema).ctx(|| format!("schema file {}", path.display()))
    }

    /// The schema bundled with the crate, see [`BUNDLED_SCHEMA`].
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_SCHEMA)
    }

    /// Validates the document, returning every violation found.
    ///
    /// Besides the schema itself, entries sharing an `issuer_id` are reported as well.
    pub fn validate(&self, document: &Value) -> Vec<SchemaViolation> {
        let mut violations: Vec<_> = self
            .validator
            .iter_errors(document)
            .map(|error| {
                let path = error.instance_path.to_string();
                SchemaViolation {
                    path: if path.is_empty() { "/".to_owned() } else { path },
                    message: error.to_string(),
                }
            })
            .collect();

        violations.extend(duplicate_issuer_ids(document));
        violations
    }

    /// Same as [`validate`](Self::validate), failing with [`Error::SchemaValidation`] unless
    /// the document is valid.
    pub fn check(&self, document: &Value) -> Result<()> {
        let violations = self.validate(document);

        if violations.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = violations.len(), "schema violations found");
        Err(bherror::Error::root(Error::SchemaValidation(
            SchemaViolations(violations),
        )))
    }
}

fn duplicate_issuer_ids(document: &Value) -> Vec<SchemaViolation> {
    let Some(entries) = document.as_array() else {
        return Vec::new();
    };

    let mut first_seen = HashMap::new();
    let mut violations = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(issuer_id) = entry.get("issuer_id").and_then(Value::as_str) else {
            continue;
        };

        let first_index = *first_seen.entry(issuer_id).or_insert(index);
        if first_index != index {
            violations.push(SchemaViolation {
                path: format!("/{index}/issuer_id"),
                message: format!(
                    "duplicate issuer_id \"{issuer_id}\", already used by entry {first_index}"
                ),
            });
        }
    }

    violations
}
