use std::fmt::Display;

use chrono::{DateTime, Months, Utc};

use super::billing_intervals::BillingInterval;

/// How far a successful payment extends the subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillingPeriodPolicy {
    /// One calendar month regardless of the plan's interval.
    #[default]
    FixedMonth,
    /// The plan's own billing interval.
    PlanInterval,
}

impl BillingPeriodPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriodPolicy::FixedMonth => "fixed_month",
            BillingPeriodPolicy::PlanInterval => "plan_interval",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed_month" => Some(BillingPeriodPolicy::FixedMonth),
            "plan_interval" => Some(BillingPeriodPolicy::PlanInterval),
            _ => None,
        }
    }

    pub fn period_end(
        &self,
        start: DateTime<Utc>,
        interval: BillingInterval,
    ) -> Option<DateTime<Utc>> {
        match self {
            BillingPeriodPolicy::FixedMonth => start.checked_add_months(Months::new(1)),
            BillingPeriodPolicy::PlanInterval => interval.period_end(start),
        }
    }
}

impl Display for BillingPeriodPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_month_ignores_plan_interval() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let end = BillingPeriodPolicy::FixedMonth
            .period_end(start, BillingInterval::Yearly)
            .unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn plan_interval_follows_the_plan() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let end = BillingPeriodPolicy::PlanInterval
            .period_end(start, BillingInterval::Quarterly)
            .unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn parses_known_values_only() {
        assert_eq!(
            BillingPeriodPolicy::from_str(" Plan_Interval "),
            Some(BillingPeriodPolicy::PlanInterval)
        );
        assert_eq!(BillingPeriodPolicy::from_str("weekly"), None);
    }
}
