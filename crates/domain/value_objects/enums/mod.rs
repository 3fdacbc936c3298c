pub mod ad_statuses;
pub mod billing_intervals;
pub mod billing_period_policies;
pub mod quota_actions;
pub mod subscription_statuses;
