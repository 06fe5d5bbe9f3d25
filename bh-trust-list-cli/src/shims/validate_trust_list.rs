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

//! Validates the trust list against its JSON schema.

use std::{io::Write, path::PathBuf};

use bh_trust_list::{TrustListSchema, TrustListStore, DEFAULT_TRUST_LIST_PATH};
use bherror::traits::PropagateError as _;
use clap::{crate_version, Parser};
use serde_json::Value;

use super::{load_schema, ExitStatus};
use crate::{
    error::{report, CliError, Result},
    logging::Verbosity,
};

/// Options of the `validate-trust-list` command.
#[derive(Debug, Parser)]
#[clap(
    name = "validate-trust-list",
    about = "A tool to validate the trust list against its JSON schema.",
    version = crate_version!()
)]
pub struct ValidateTrustListOpts {
    /// Filepath of the trust list
    #[clap(long, default_value = DEFAULT_TRUST_LIST_PATH)]
    pub trust_list: PathBuf,
    /// Filepath of the trust list schema, defaults to trust-list.schema.json if present and to
    /// the bundled schema otherwise
    #[clap(long)]
    pub schema: Option<PathBuf>,
    #[clap(flatten)]
    #[allow(missing_docs)]
    pub verbosity: Verbosity,
}

/// Validates the trust list, listing every violation on `stderr`.
pub fn main<W: Write, E: Write>(
    opts: &ValidateTrustListOpts,
    stdout: &mut W,
    stderr: &mut E,
) -> std::io::Result<ExitStatus> {
    let (document, schema) = match load(opts) {
        Ok(loaded) => loaded,
        Err(err) => {
            writeln!(stderr, "❌ {}", report(&err))?;
            return Ok(ExitStatus::Failure);
        }
    };

    let violations = schema.validate(&document);
    if violations.is_empty() {
        writeln!(stdout, "✅ Trust list validation passed")?;
        return Ok(ExitStatus::Success);
    }

    tracing::info!(count = violations.len(), "trust list validation failed");

    writeln!(stderr, "❌ Trust list validation failed:")?;
    for violation in &violations {
        writeln!(stderr, "  - {violation}")?;
    }

    Ok(ExitStatus::Failure)
}

fn load(opts: &ValidateTrustListOpts) -> Result<(Value, TrustListSchema)> {
    let document = TrustListStore::new(&opts.trust_list)
        .read_document()
        .with_err(|| CliError::ValidateTrustList)?;

    let schema =
        load_schema(opts.schema.as_deref()).with_err(|| CliError::ValidateTrustList)?;

    Ok((document, schema))
}
