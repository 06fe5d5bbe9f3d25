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

//! Turns a certificate file into a trust list entry, optionally merging it into the trust list.

use std::{io::Write, path::PathBuf};

use bh_trust_list::{
    serializer, CertificateMetadata, EntryDefaults, MergeCandidate, MergeOutcome, TrustListStore,
    DEFAULT_ENTITY_TYPE, DEFAULT_TRUST_LIST_PATH,
};
use bherror::traits::PropagateError as _;
use clap::{crate_version, Parser};

use super::{load_schema, ExitStatus};
use crate::{
    error::{report, CliError, Result},
    logging::Verbosity,
};

/// Options of the `pem-to-entry` command.
#[derive(Debug, Parser)]
#[clap(
    name = "pem-to-entry",
    about = "A tool to create a trust list entry out of a certificate file (.pem, .cer, .crt or .der).",
    version = crate_version!()
)]
pub struct PemToEntryOpts {
    /// Filepath of the certificate
    pub certificate: PathBuf,
    /// Add the entry directly to the trust list instead of printing it
    #[clap(long)]
    pub add: bool,
    /// Print the human-readable certificate before the entry
    #[clap(long)]
    pub print_cert: bool,
    /// Filepath of the trust list
    #[clap(long, default_value = DEFAULT_TRUST_LIST_PATH)]
    pub trust_list: PathBuf,
    /// Filepath of the trust list schema, defaults to trust-list.schema.json if present and to
    /// the bundled schema otherwise
    #[clap(long)]
    pub schema: Option<PathBuf>,
    /// Where the certificate was obtained from, stored in the record's `source`
    #[clap(long, default_value = "")]
    pub source: String,
    /// The `entity_type` of a newly created entry
    #[clap(long, default_value = DEFAULT_ENTITY_TYPE)]
    pub entity_type: String,
    #[clap(flatten)]
    #[allow(missing_docs)]
    pub verbosity: Verbosity,
}

/// Prints the entry for the certificate, or merges it into the trust list with `--add`.
pub fn main<W: Write, E: Write>(
    opts: &PemToEntryOpts,
    stdout: &mut W,
    stderr: &mut E,
) -> std::io::Result<ExitStatus> {
    let (candidate, text) = match prepare_candidate(opts) {
        Ok(prepared) => prepared,
        Err(err) => return fail(stderr, &err),
    };

    if let Some(text) = text {
        writeln!(stdout, "{text}")?;
    }

    if !opts.add {
        let entry = match serializer::to_canonical_string(&candidate.to_entry())
            .with_err(|| CliError::ExtractCertificate)
        {
            Ok(entry) => entry,
            Err(err) => return fail(stderr, &err),
        };

        writeln!(stdout, "{entry}")?;
        return Ok(ExitStatus::Success);
    }

    let store = TrustListStore::new(&opts.trust_list);
    match add_entry(&store, candidate, opts) {
        Ok(outcome) => {
            writeln!(stdout, "✅ {outcome} in {}", store.path().display())?;
            Ok(ExitStatus::Success)
        }
        Err(err) => fail(stderr, &err),
    }
}

fn fail<E: Write>(stderr: &mut E, err: &bherror::Error<CliError>) -> std::io::Result<ExitStatus> {
    writeln!(stderr, "Error: {}", report(err))?;
    Ok(ExitStatus::Failure)
}

fn prepare_candidate(opts: &PemToEntryOpts) -> Result<(MergeCandidate, Option<String>)> {
    let metadata = CertificateMetadata::from_file(&opts.certificate)
        .with_err(|| CliError::ExtractCertificate)?;

    let text = if opts.print_cert {
        Some(metadata.to_text().with_err(|| CliError::ExtractCertificate)?)
    } else {
        None
    };

    let defaults = EntryDefaults {
        entity_type: opts.entity_type.clone(),
        source: opts.source.clone(),
    };
    let candidate = MergeCandidate::from_metadata(&metadata, &defaults)
        .with_err(|| CliError::ExtractCertificate)?;

    tracing::info!(issuer_id = %candidate.issuer_id(), ski = %metadata.ski, "certificate parsed");

    Ok((candidate, text))
}

fn add_entry(
    store: &TrustListStore,
    candidate: MergeCandidate,
    opts: &PemToEntryOpts,
) -> Result<MergeOutcome> {
    let schema = load_schema(opts.schema.as_deref()).with_err(|| CliError::AddEntry)?;

    store
        .add_certificate(candidate, &schema)
        .with_err(|| CliError::AddEntry)
}
