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

//! One module per command.  Every module exposes the command's `clap` options and a `main`
//! function writing to the given output streams.

use std::path::Path;

use bh_trust_list::{TrustListSchema, DEFAULT_SCHEMA_PATH};

pub mod check_expirations;
pub mod pem_to_entry;
pub mod validate_trust_list;

/// Outcome of a command, mapped to the process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exit code 0.
    Success,
    /// Exit code 1.
    Failure,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::SUCCESS,
            ExitStatus::Failure => Self::FAILURE,
        }
    }
}

/// Loads the schema from `path`, falling back to [`DEFAULT_SCHEMA_PATH`] if it exists, and to the
/// bundled schema otherwise.
pub fn load_schema(path: Option<&Path>) -> bh_trust_list::Result<TrustListSchema> {
    match path {
        Some(path) => TrustListSchema::from_file(path),
        None if Path::new(DEFAULT_SCHEMA_PATH).is_file() => {
            TrustListSchema::from_file(DEFAULT_SCHEMA_PATH)
        }
        None => {
            tracing::debug!("{DEFAULT_SCHEMA_PATH} not found, using the bundled schema");
            TrustListSchema::bundled()
        }
    }
}
