pub mod enums;
pub mod limits;
pub mod plans;
pub mod quota;
pub mod subscriptions;
pub mod webhooks;
