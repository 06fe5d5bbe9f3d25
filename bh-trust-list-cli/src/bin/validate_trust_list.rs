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
    io::{stderr, stdout},
    process::ExitCode,
};

use bh_trust_list_cli::{logging, shims::validate_trust_list};
use clap::Parser;

fn main() -> ExitCode {
    let opts = validate_trust_list::ValidateTrustListOpts::parse();
    logging::init(opts.verbosity);

    match validate_trust_list::main(&opts, &mut stdout(), &mut stderr()) {
        Ok(status) => status.into(),
        Err(_) => ExitCode::FAILURE,
    }
}
