pub mod billing;
pub mod clock;
pub mod gateway_webhooks;
pub mod plan_catalog;
pub mod quota;
pub mod subscription_lifecycle;

#[cfg(test)]
pub(crate) mod test_support;
