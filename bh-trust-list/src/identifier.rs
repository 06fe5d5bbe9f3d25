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

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bherror::traits::{ErrorContext as _, ForeignError as _};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix of every [`IssuerId`], denoting the identifier is derived from the Subject Key
/// Identifier (referred to by the Authority Key Identifier of issued certificates).
pub const ISSUER_ID_PREFIX: &str = "x509_aki:";

/// Stable identifier of an issuer within the trust list.
///
/// It is the `base64url` encoding **without padding** of the Subject Key Identifier bytes,
/// prefixed with [`ISSUER_ID_PREFIX`], e.g. `x509_aki:qrvM3Q` for the SKI `AA:BB:CC:DD`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerId(String);

impl IssuerId {
    /// Derives the [`IssuerId`] from the Subject Key Identifier given as a colon-separated hex
    /// string, e.g. `A1:B2:C3`.
    ///
    /// The hex digits are case-insensitive.  An empty string, an odd number of digits or any
    /// character other than hex digits and colons, surrounding whitespace included, results in
    /// [`Error::MalformedIdentifier`].
    pub fn from_ski(ski: &str) -> Result<Self> {
        let hex_digits: String = ski.chars().filter(|c| *c != ':').collect();

        if hex_digits.is_empty() {
            return Err(bherror::Error::root(Error::MalformedIdentifier(ski.to_owned()))
                .ctx("Subject Key Identifier is empty"));
        }

        let bytes = hex::decode(&hex_digits)
            .foreign_err(|| Error::MalformedIdentifier(ski.to_owned()))
            .ctx(|| "Subject Key Identifier is not a valid hex string")?;

        Ok(Self::from_ski_bytes(&bytes))
    }

    /// Derives the [`IssuerId`] from the raw Subject Key Identifier bytes.
    pub fn from_ski_bytes(ski: &[u8]) -> Self {
        Self(format!("{ISSUER_ID_PREFIX}{}", URL_SAFE_NO_PAD.encode(ski)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssuerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
