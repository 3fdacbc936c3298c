pub mod ads;
pub mod plans;
pub mod quota_events;
pub mod subscriptions;
pub mod webhook_logs;
