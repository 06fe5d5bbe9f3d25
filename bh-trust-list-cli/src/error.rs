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

//! Errors of the commands and their rendering.

/// Error returned by the commands.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum CliError {
    /// Evaluating the certificate expirations failed.
    #[strum(to_string = "Error checking certificate expirations")]
    CheckExpirations,
    /// The input certificate could not be turned into an entry.
    #[strum(to_string = "Unable to process the certificate")]
    ExtractCertificate,
    /// Merging the entry into the trust list failed.
    #[strum(to_string = "Failed to add entry to trust list")]
    AddEntry,
    /// The trust list or the schema could not be loaded for validation.
    #[strum(to_string = "Error validating trust list")]
    ValidateTrustList,
}

impl bherror::BhError for CliError {}

/// The [`bherror::Result`] type with the [`CliError`] error type.
pub type Result<T> = bherror::Result<T, CliError>;

/// Renders the error followed by all of its sources, separated by `": "`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// Renders the error for the user with [`error_chain`].  The full error, context included, is
/// logged at debug level.
pub fn report(error: &bherror::Error<CliError>) -> String {
    tracing::debug!(error = ?error, "command failed");
    error_chain(error)
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use bh_trust_list::IssuerId;
    use bherror::traits::PropagateError as _;
    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn report_with_level(level: Level, err: &bherror::Error<CliError>) -> (String, String) {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let message = tracing::subscriber::with_default(subscriber, || report(err));
        (message, buffer.contents())
    }

    #[test]
    fn test_error_chain() {
        let err = IssuerId::from_ski("zz")
            .with_err(|| CliError::ExtractCertificate)
            .unwrap_err();

        let message = error_chain(&err);
        assert!(message.starts_with(
            "Unable to process the certificate: Malformed Subject Key Identifier \"zz\": "
        ));
        // the hex decoding error is the last source
        assert_eq!(message.split(": ").count(), 3);
    }
    #[test]
    fn test_report_logs_only_when_debugging() {
        let err = IssuerId::from_ski("zz")
            .with_err(|| CliError::ExtractCertificate)
            .unwrap_err();

        let (message, logged) = report_with_level(Level::ERROR, &err);
        assert_eq!(message, error_chain(&err));
        assert!(logged.is_empty());

        let (message, logged) = report_with_level(Level::WARN, &err);
        assert_eq!(message, error_chain(&err));
        assert!(logged.is_empty());

        let (message, logged) = report_with_level(Level::DEBUG, &err);
        assert_eq!(message, error_chain(&err));
        assert!(logged.contains("command failed"));
        assert!(logged.contains("Subject Key Identifier is not a valid hex string"));
    }
}
