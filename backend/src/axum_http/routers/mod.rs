pub mod billing;
pub mod quota;
pub mod webhooks;
