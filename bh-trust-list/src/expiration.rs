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

use std::fmt;

use bherror::traits::ErrorContext as _;
use chrono::{DateTime, Months, Utc};

use crate::{Result, TrustList, Validity};

const MILLISECONDS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Thresholds used to classify certificate expirations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpirationPolicy {
    /// Certificates expiring within this many calendar months are reported as expiring soon.
    pub warning_months: u32,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self { warning_months: 1 }
    }
}

impl ExpirationPolicy {
    /// Creates a policy with the given warning horizon.
    pub fn new(warning_months: u32) -> Self {
        Self { warning_months }
    }

    /// The end of the warning horizon starting at `now`.
    pub fn warning_horizon_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_months(Months::new(self.warning_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Classifies an expiration time relative to `now`.
    pub fn classify(&self, not_after: DateTime<Utc>, now: DateTime<Utc>) -> ExpirationStatus {
        if not_after <= now {
            ExpirationStatus::Expired
        } else if not_after <= self.warning_horizon_end(now) {
            ExpirationStatus::ExpiringSoon
        } else {
            ExpirationStatus::Valid
        }
    }
}

/// Expiration status of a single certificate.
#[derive(strum_macros::Display, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpirationStatus {
    /// `notAfter` is not after now.
    #[strum(to_string = "expired")]
    Expired,
    /// `notAfter` falls within the warning horizon.
    #[strum(to_string = "expiring soon")]
    ExpiringSoon,
    /// `notAfter` is past the warning horizon.
    #[strum(to_string = "valid")]
    Valid,
}

/// Whole days until `not_after`, rounded up.  Negative for already expired certificates.
pub fn days_until_expiration(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let milliseconds = (not_after - now).num_milliseconds();
    (milliseconds + MILLISECONDS_PER_DAY - 1).div_euclid(MILLISECONDS_PER_DAY)
}

/// A certificate which is either expired or expiring soon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpirationFinding {
    /// Either [`ExpirationStatus::Expired`] or [`ExpirationStatus::ExpiringSoon`].
    pub status: ExpirationStatus,
    /// 1-based position of the entry in the trust list.
    pub issuer_position: usize,
    /// Name of the entry.
    pub issuer_name: String,
    /// 1-based position of the certificate within the entry.
    pub certificate_position: usize,
    /// The `notAfter` time of the certificate.
    pub expires_at: DateTime<Utc>,
    /// See [`days_until_expiration`].
    pub days_until_expiration: i64,
}

impl fmt::Display for ExpirationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.expires_at.format("%Y-%m-%d");

        write!(
            f,
            "Issuer {} ({}): Certificate {} ",
            self.issuer_position, self.issuer_name, self.certificate_position
        )?;

        match self.status {
            ExpirationStatus::ExpiringSoon => {
                write!(f, "expires in {} days on {date}", self.days_until_expiration)
            }
            _ => write!(f, "expired on {date}"),
        }
    }
}

/// Outcome of [`evaluate`], findings in trust list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpirationReport {
    /// Certificates past their `notAfter` time.
    pub expired: Vec<ExpirationFinding>,
    /// Certificates expiring within the warning horizon.
    pub expiring_soon: Vec<ExpirationFinding>,
}

impl ExpirationReport {
    /// Returns `true` if nothing is expired or expiring soon.
    pub fn is_clean(&self) -> bool {
        self.expired.is_empty() && self.expiring_soon.is_empty()
    }
}

/// Evaluates every certificate of the trust list against the policy.
///
/// Records with `allowExpired: true` are skipped.  The first certificate which cannot be parsed
/// aborts the evaluation.
pub fn evaluate(
    trust_list: &TrustList,
    policy: &ExpirationPolicy,
    now: DateTime<Utc>,
) -> Result<ExpirationReport> {
    let mut report = ExpirationReport::default();

    for (issuer_index, entry) in trust_list.entries().iter().enumerate() {
        let issuer_position = issuer_index + 1;

        for (certificate_index, record) in entry.certificates.iter().enumerate() {
            let certificate_position = certificate_index + 1;

            if record.allows_expired() {
                tracing::trace!(issuer_position, certificate_position, "expiration allowed");
                continue;
            }

            let not_after = Validity::from_pem(&record.certificate)
                .ctx(|| {
                    format!(
                        "Issuer {issuer_position} ({}): Certificate {certificate_position}",
                        entry.name
                    )
                })?
                .not_after;

            let status = policy.classify(not_after, now);
            let finding = ExpirationFinding {
                status,
                issuer_position,
                issuer_name: entry.name.clone(),
                certificate_position,
                expires_at: not_after,
                days_until_expiration: days_until_expiration(not_after, now),
            };

            match status {
                ExpirationStatus::Expired => report.expired.push(finding),
                ExpirationStatus::ExpiringSoon => report.expiring_soon.push(finding),
                ExpirationStatus::Valid => {}
            }
        }
    }

    tracing::debug!(
        expired = report.expired.len(),
        expiring_soon = report.expiring_soon.len(),
        "evaluated certificate expirations"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone as _};

    use super::*;
    use crate::{
        test_utils::{CertificateFactory, CertificateTemplate},
        CertificateRecord, Error, IssuerId, TrustListEntry,
    };

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn entry(name: &str, ski: &str, certificates: Vec<CertificateRecord>) -> TrustListEntry {
        TrustListEntry {
            issuer_id: IssuerId::from_ski(ski).unwrap(),
            entity_type: "government".to_owned(),
            name: name.to_owned(),
            certificates,
            extra: Default::default(),
        }
    }

    fn record_expiring_at(not_after: DateTime<Utc>) -> CertificateRecord {
        let pem = CertificateFactory::new()
            .issue_pem(&CertificateTemplate::default().valid_until(not_after));
        CertificateRecord::new(pem, String::new())
    }

    #[test]
    fn test_classify_boundaries() {
        let policy = ExpirationPolicy::default();
        let now = at(2025, 1, 15);

        assert_eq!(policy.classify(now, now), ExpirationStatus::Expired);
        assert_eq!(
            policy.classify(now - Duration::seconds(1), now),
            ExpirationStatus::Expired
        );
        assert_eq!(
            policy.classify(now + Duration::seconds(1), now),
            ExpirationStatus::ExpiringSoon
        );
        assert_eq!(
            policy.classify(at(2025, 2, 15), now),
            ExpirationStatus::ExpiringSoon
        );
        assert_eq!(
            policy.classify(at(2025, 2, 15) + Duration::seconds(1), now),
            ExpirationStatus::Valid
        );
    }

    #[test]
    fn test_warning_horizon_is_calendar_months() {
        let policy = ExpirationPolicy::new(1);
        assert_eq!(policy.warning_horizon_end(at(2025, 1, 31)), at(2025, 2, 28));

        let policy = ExpirationPolicy::new(3);
        assert_eq!(policy.warning_horizon_end(at(2025, 1, 15)), at(2025, 4, 15));

        let policy = ExpirationPolicy::new(0);
        let now = at(2025, 1, 15);
        assert_eq!(
            policy.classify(now + Duration::seconds(1), now),
            ExpirationStatus::Valid
        );

        let policy = ExpirationPolicy::new(u32::MAX);
        assert_eq!(policy.warning_horizon_end(now), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_days_until_expiration() {
        let now = at(2025, 1, 15);

        assert_eq!(days_until_expiration(now, now), 0);
        assert_eq!(days_until_expiration(now + Duration::milliseconds(1), now), 1);
        assert_eq!(days_until_expiration(now + Duration::days(1), now), 1);
        assert_eq!(
            days_until_expiration(now + Duration::days(1) + Duration::hours(1), now),
            2
        );
        assert_eq!(days_until_expiration(now - Duration::hours(1), now), 0);
        assert_eq!(days_until_expiration(now - Duration::days(2), now), -2);
    }

    #[test]
    fn test_finding_display() {
        let finding = ExpirationFinding {
            status: ExpirationStatus::ExpiringSoon,
            issuer_position: 2,
            issuer_name: "TBTL".to_owned(),
            certificate_position: 1,
            expires_at: at(2025, 2, 1),
            days_until_expiration: 17,
        };
        assert_eq!(
            finding.to_string(),
            "Issuer 2 (TBTL): Certificate 1 expires in 17 days on 2025-02-01"
        );

        let finding = ExpirationFinding {
            status: ExpirationStatus::Expired,
            days_until_expiration: -3,
            ..finding
        };
        assert_eq!(
            finding.to_string(),
            "Issuer 2 (TBTL): Certificate 1 expired on 2025-02-01"
        );
    }

    #[test]
    fn test_evaluate() {
        let now = at(2025, 6, 1);
        let expired = record_expiring_at(now - Duration::days(2));
        let soon = record_expiring_at(now + Duration::days(10));
        let valid = record_expiring_at(now + Duration::days(200));
        let allowed = CertificateRecord {
            allow_expired: Some(true),
            ..record_expiring_at(now - Duration::days(400))
        };

        let trust_list = TrustList::from(vec![
            entry("First", "01", vec![valid.clone(), expired]),
            entry("Second", "02", vec![allowed, soon, valid]),
        ]);
        let before = trust_list.clone();

        let report = evaluate(&trust_list, &ExpirationPolicy::default(), now).unwrap();
        assert_eq!(trust_list, before);
        assert!(!report.is_clean());

        assert_eq!(report.expired.len(), 1);
        let finding = &report.expired[0];
        assert_eq!(finding.status, ExpirationStatus::Expired);
        assert_eq!(
            (finding.issuer_position, finding.certificate_position),
            (1, 2)
        );
        assert_eq!(finding.issuer_name, "First");
        assert_eq!(finding.days_until_expiration, -2);

        assert_eq!(report.expiring_soon.len(), 1);
        let finding = &report.expiring_soon[0];
        assert_eq!(finding.status, ExpirationStatus::ExpiringSoon);
        assert_eq!(
            (finding.issuer_position, finding.certificate_position),
            (2, 2)
        );
        assert_eq!(finding.days_until_expiration, 10);
        assert_eq!(finding.expires_at, now + Duration::days(10));
    }

    #[test]
    fn test_evaluate_clean() {
        let now = at(2025, 6, 1);
        let trust_list = TrustList::from(vec![entry(
            "Only",
            "01",
            vec![record_expiring_at(now + Duration::days(365))],
        )]);

        let report = evaluate(&trust_list, &ExpirationPolicy::default(), now).unwrap();
        assert!(report.is_clean());

        assert!(evaluate(&TrustList::new(), &ExpirationPolicy::default(), now)
            .unwrap()
            .is_clean());
    }

    #[test]
    fn test_evaluate_fails_fast() {
        let now = at(2025, 6, 1);
        let trust_list = TrustList::from(vec![
            entry("First", "01", vec![record_expiring_at(now - Duration::days(1))]),
            entry(
                "Second",
                "02",
                vec![CertificateRecord::new("corrupted".to_owned(), String::new())],
            ),
        ]);

        let err = evaluate(&trust_list, &ExpirationPolicy::default(), now).unwrap_err();
        assert_matches!(err.error, Error::UnparsableCertificate);
        assert!(format!("{err:?}").contains("Issuer 2 (Second): Certificate 1"));
    }

    #[test]
    fn test_evaluate_skips_unparsable_allowed_record() {
        let now = at(2025, 6, 1);
        let trust_list = TrustList::from(vec![entry(
            "Only",
            "01",
            vec![CertificateRecord {
                allow_expired: Some(true),
                ..CertificateRecord::new("corrupted".to_owned(), String::new())
            }],
        )]);

        assert!(evaluate(&trust_list, &ExpirationPolicy::default(), now)
            .unwrap()
            .is_clean());
    }
}
