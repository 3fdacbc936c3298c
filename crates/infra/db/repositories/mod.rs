pub mod ads;
pub mod plans;
pub mod quota_usage;
pub mod subscriptions;
pub mod webhook_logs;
