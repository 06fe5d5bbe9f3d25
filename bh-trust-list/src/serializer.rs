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

//! Canonical textual form of the trust list.
//!
//! The trust list is kept under version control, so its on-disk form is pinned to keep diffs
//! minimal: two-space indentation, keys in their declared order, and adjacent objects within an
//! array joined on a single line as `}, {`.  The document ends with a single newline.

use bherror::traits::{ErrorContext as _, ForeignError as _};
use serde::Serialize;

use crate::{Error, Result, TrustList};

/// Serializes the value into the canonical form, without the trailing newline.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let pretty = serde_json::to_string_pretty(value)
        .foreign_err(|| Error::RegistryWrite)
        .ctx(|| "cannot serialize to JSON")?;

    Ok(join_adjacent_objects(&pretty))
}

/// Serializes the trust list into the canonical document, including the trailing newline.
pub fn to_document(trust_list: &TrustList) -> Result<String> {
    let mut document = to_canonical_string(trust_list)?;
    document.push('\n');
    Ok(document)
}

/// Parses the trust list document.
pub fn parse(document: &str) -> Result<TrustList> {
    serde_json::from_str(document)
        .foreign_err(|| Error::RegistryRead)
        .ctx(|| "invalid trust list document")
}

/// Joins `}`, `,`, `{` separated only by whitespace into `}, {`.
///
/// Only structural characters are affected, string contents are copied verbatim.
fn join_adjacent_objects(json: &str) -> String {
    let mut output = String::with_capacity(json.len());
    let mut chars = json.char_indices().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some((index, c)) = chars.next() {
        output.push(c);

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '}' => {
                if let Some(skip) = object_separator_len(&json[index + 1..]) {
                    output.push_str(", {");
                    // consume the separator including the opening brace
                    for _ in 0..skip {
                        chars.next();
                    }
                }
            }
            _ => {}
        }
    }

    output
}

/// Returns the number of characters up to and including `{` if the input starts with
/// `<whitespace>,<whitespace>{`.
fn object_separator_len(rest: &str) -> Option<usize> {
    let mut count = 0;
    let mut seen_comma = false;

    for c in rest.chars() {
        count += 1;
        match c {
            c if c.is_whitespace() => {}
            ',' if !seen_comma => seen_comma = true,
            '{' if seen_comma => return Some(count),
            _ => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::{CertificateRecord, IssuerId, TrustListEntry};

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----";

    fn entry(ski: &str, name: &str, certificates: Vec<CertificateRecord>) -> TrustListEntry {
        TrustListEntry {
            issuer_id: IssuerId::from_ski(ski).unwrap(),
            entity_type: "government".to_owned(),
            name: name.to_owned(),
            certificates,
            extra: Default::default(),
        }
    }

    fn sample() -> TrustList {
        TrustList::from(vec![
            entry(
                "AA:BB:CC:DD",
                "First",
                vec![
                    CertificateRecord::new(PEM.to_owned(), String::new()),
                    CertificateRecord {
                        allow_expired: Some(true),
                        ..CertificateRecord::new("second".to_owned(), "manual".to_owned())
                    },
                ],
            ),
            entry(
                "01:02",
                "Second }, { tricky",
                vec![CertificateRecord::new("third".to_owned(), String::new())],
            ),
        ])
    }

    #[test]
    fn test_canonical_form() {
        let expected = r#"[
  {
    "issuer_id": "x509_aki:qrvM3Q",
    "entity_type": "government",
    "name": "First",
    "certificates": [
      {
        "certificate": "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----",
        "certificate_format": "pem",
        "source": ""
      }, {
        "certificate": "second",
        "certificate_format": "pem",
        "source": "manual",
        "allowExpired": true
      }
    ]
  }, {
    "issuer_id": "x509_aki:AQI",
    "entity_type": "government",
    "name": "Second }, { tricky",
    "certificates": [
      {
        "certificate": "third",
        "certificate_format": "pem",
        "source": ""
      }
    ]
  }
]
"#;

        assert_eq!(to_document(&sample()).unwrap(), expected);
    }

    #[test]
    fn test_empty_trust_list() {
        assert_eq!(to_document(&TrustList::new()).unwrap(), "[]\n");
        assert_eq!(parse("[]\n").unwrap(), TrustList::new());
    }

    #[test]
    fn test_round_trip() {
        let document = to_document(&sample()).unwrap();
        let parsed = parse(&document).unwrap();

        assert_eq!(parsed, sample());
        assert_eq!(to_document(&parsed).unwrap(), document);
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse("{").unwrap_err();
        assert_matches!(err.error, Error::RegistryRead);

        let err = parse(&json!([{"issuer_id": "x509_aki:AA"}]).to_string()).unwrap_err();
        assert_matches!(err.error, Error::RegistryRead);
    }

    #[test]
    fn test_join_adjacent_objects() {
        assert_eq!(join_adjacent_objects("[{}\n ,\n {}]"), "[{}, {}]");
        assert_eq!(join_adjacent_objects("[{}, {}]"), "[{}, {}]");
        // only objects following objects are joined
        assert_eq!(join_adjacent_objects("[1,\n {}]"), "[1,\n {}]");
        assert_eq!(join_adjacent_objects("[{},\n 1]"), "[{},\n 1]");
        // strings are untouched, including escaped quotes
        assert_eq!(
            join_adjacent_objects(r#"["}\n,\n{", "\"}\n,{"]"#),
            r#"["}\n,\n{", "\"}\n,{"]"#
        );
        assert_eq!(
            join_adjacent_objects("[\"a\\\\\", {}\n,\n{}]"),
            "[\"a\\\\\", {}, {}]"
        );
    }
}
