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

//! Reports certificates in the trust list which are expired or expire soon.

use std::{io::Write, path::PathBuf};

use bh_trust_list::{
    evaluate, ExpirationPolicy, ExpirationReport, TrustListStore, DEFAULT_TRUST_LIST_PATH,
};
use bherror::traits::PropagateError as _;
use chrono::{DateTime, Utc};
use clap::{crate_version, Parser, ValueEnum};

use super::ExitStatus;
use crate::{
    error::{self, CliError, Result},
    logging::Verbosity,
};

/// Options of the `check-expirations` command.
#[derive(Debug, Parser)]
#[clap(
    name = "check-expirations",
    about = "A tool to report expired and soon expiring certificates in the trust list.",
    version = crate_version!()
)]
pub struct CheckExpirationsOpts {
    /// Filepath of the trust list
    #[clap(long, default_value = DEFAULT_TRUST_LIST_PATH)]
    pub trust_list: PathBuf,
    /// Certificates expiring within this many months are reported as expiring soon
    #[clap(long, default_value_t = 1)]
    pub warning_months: u32,
    /// Which findings make the command exit with a failure
    #[clap(long, value_enum, default_value_t = FailOn::Never)]
    pub fail_on: FailOn,
    #[clap(flatten)]
    #[allow(missing_docs)]
    pub verbosity: Verbosity,
}

/// Findings which result in [`ExitStatus::Failure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Findings are only reported.
    Never,
    /// Fail if any certificate is expired.
    Expired,
    /// Fail if any certificate is expired or expiring soon.
    Expiring,
}

impl FailOn {
    fn fails(self, report: &ExpirationReport) -> bool {
        match self {
            Self::Never => false,
            Self::Expired => !report.expired.is_empty(),
            Self::Expiring => !report.is_clean(),
        }
    }
}

/// Evaluates the trust list at `now`.  Findings are listed on `stderr` and summarized on
/// `stdout`.
pub fn main<W: Write, E: Write>(
    opts: &CheckExpirationsOpts,
    now: DateTime<Utc>,
    stdout: &mut W,
    stderr: &mut E,
) -> std::io::Result<ExitStatus> {
    let report = match run(opts, now) {
        Ok(report) => report,
        Err(err) => {
            writeln!(stderr, "❌ {}", error::report(&err))?;
            return Ok(ExitStatus::Failure);
        }
    };

    if !report.expiring_soon.is_empty() {
        writeln!(stderr, "⚠️  Certificate expirations upcoming soon:")?;
        for finding in &report.expiring_soon {
            writeln!(stderr, "  - {finding}")?;
        }
    }

    if !report.expired.is_empty() {
        writeln!(stderr, "❌ Certificate expirations:")?;
        for finding in &report.expired {
            writeln!(stderr, "  - {finding}")?;
        }
    }

    if !report.expiring_soon.is_empty() {
        writeln!(
            stdout,
            "⚠️  {} certificate(s) expiring soon - please review",
            report.expiring_soon.len()
        )?;
    }
    if !report.expired.is_empty() {
        writeln!(
            stdout,
            "❌  {} certificate(s) expired - please review",
            report.expired.len()
        )?;
    }
    if report.is_clean() {
        writeln!(stdout, "✅ No expired or expiring certificates found")?;
    }

    if opts.fail_on.fails(&report) {
        Ok(ExitStatus::Failure)
    } else {
        Ok(ExitStatus::Success)
    }
}

fn run(opts: &CheckExpirationsOpts, now: DateTime<Utc>) -> Result<ExpirationReport> {
    let trust_list = TrustListStore::new(&opts.trust_list)
        .load()
        .with_err(|| CliError::CheckExpirations)?;

    evaluate(&trust_list, &ExpirationPolicy::new(opts.warning_months), now)
        .with_err(|| CliError::CheckExpirations)
}
