use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::limits::Limit;

/// Half-open `[starts_at, ends_at)` window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPeriod {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl QuotaPeriod {
    /// The calendar month containing `now`, with month boundaries taken at local
    /// midnight in `tz`.
    pub fn calendar_month_of<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Option<Self> {
        let local = now.with_timezone(tz);
        let first_day = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)?;
        let next_first_day = first_day.checked_add_months(Months::new(1))?;

        Some(Self {
            starts_at: local_midnight(tz, first_day)?,
            ends_at: local_midnight(tz, next_first_day)?,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.starts_at && at < self.ends_at
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    // Zones whose DST jump skips midnight have no local 00:00; use the UTC reading instead.
    let instant = match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    };
    Some(instant)
}

/// Raw usage counters for one period. Consumption records are reservations
/// for ads that are about to be created; ads created since the first
/// reservation are assumed to settle outstanding reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaUsage {
    pub ads_created: u64,
    pub consumed: u64,
    /// Counted ads created at or after the period's first reservation.
    pub ads_since_first_reservation: u64,
}

impl QuotaUsage {
    /// Every counted ad plus the reservations that have no ad yet.
    pub fn used(&self) -> u64 {
        let outstanding = self
            .consumed
            .saturating_sub(self.ads_since_first_reservation);
        self.ads_created.saturating_add(outstanding)
    }
}

/// Input to the atomic recount-and-record step.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaConsumption {
    pub user_id: i64,
    pub plan_id: i64,
    pub amount: u32,
    pub allowed: Limit,
    pub period: QuotaPeriod,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Granted { used: u64 },
    Exceeded { used: u64 },
    NotEntitled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaStatus {
    pub allowed: Limit,
    pub used: u64,
    pub remaining: Limit,
    pub plan_quota: Option<String>,
    pub plan_name: Option<String>,
}

impl QuotaStatus {
    pub fn no_entitlement() -> Self {
        Self {
            allowed: Limit::ZERO,
            used: 0,
            remaining: Limit::ZERO,
            plan_quota: None,
            plan_name: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsumeQuotaRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct ConsumeQuotaResponse {
    pub used: u64,
    pub remaining: Limit,
}

#[derive(Debug, Deserialize)]
pub struct ResetQuotaRequest {
    pub user_id: i64,
    pub plan_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ResetQuotaResponse {
    pub acknowledged: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageAllowanceQuery {
    #[serde(default = "default_incoming")]
    pub incoming: u64,
}

fn default_incoming() -> u64 {
    1
}

#[derive(Debug, Serialize)]
pub struct ImageAllowanceResponse {
    pub ad_id: i64,
    pub allowed: bool,
    pub current_images: u64,
    pub max_images: Limit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn month_bounds_follow_local_zone() {
        // 2024-03-31T20:00Z is already April 1st at UTC+07:00.
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 20, 0, 0).unwrap();
        let bangkok = FixedOffset::east_opt(7 * 3600).unwrap();

        let period = QuotaPeriod::calendar_month_of(now, &bangkok).unwrap();

        assert_eq!(
            period.starts_at,
            Utc.with_ymd_and_hms(2024, 3, 31, 17, 0, 0).unwrap()
        );
        assert_eq!(
            period.ends_at,
            Utc.with_ymd_and_hms(2024, 4, 30, 17, 0, 0).unwrap()
        );
        assert!(period.contains(now));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let now = Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap();
        let period = QuotaPeriod::calendar_month_of(now, &Utc).unwrap();
        assert_eq!(period.ends_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(!period.contains(period.ends_at));
    }

    #[test]
    fn reservations_add_to_earlier_ads() {
        let usage = QuotaUsage {
            ads_created: 19,
            consumed: 1,
            ads_since_first_reservation: 0,
        };
        assert_eq!(usage.used(), 20);
    }

    #[test]
    fn settled_reservations_are_not_counted_twice() {
        let usage = QuotaUsage {
            ads_created: 4,
            consumed: 3,
            ads_since_first_reservation: 2,
        };
        assert_eq!(usage.used(), 5);

        let usage = QuotaUsage {
            ads_created: 6,
            consumed: 3,
            ads_since_first_reservation: 5,
        };
        assert_eq!(usage.used(), 6);
    }
}
