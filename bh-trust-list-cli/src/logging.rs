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

//! Logging setup shared by the binaries.

use clap::{ArgAction, Args};
use tracing::Level;

/// The `-v/--verbose` flag.
#[derive(Args, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verbosity {
    #[clap(
        short,
        long = "verbose",
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)"
    )]
    verbose: u8,
}

impl Verbosity {
    /// Creates the flag as if `-v` was given `verbose` times.
    pub fn new(verbose: u8) -> Self {
        Self { verbose }
    }

    /// The most verbose level which is logged.
    pub fn level(&self) -> Level {
        match self.verbose {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Installs the global subscriber writing to stderr.  Records from the `log` crate are captured
/// as well.
///
/// Does nothing if a global subscriber is already installed.
pub fn init(verbosity: Verbosity) {
    let result = tracing_subscriber::fmt()
        .with_max_level(verbosity.level())
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
