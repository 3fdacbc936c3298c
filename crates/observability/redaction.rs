pub const REDACTED: &str = "[REDACTED]";

/// Names that carry credentials: auth headers, cookies, API keys, signatures.
pub fn is_sensitive_key(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.contains("authorization")
        || name.contains("cookie")
        || name.contains("secret")
        || name.contains("password")
        || name.contains("token")
        || name.contains("signature")
        || name.contains("api-key")
        || name.contains("apikey")
}

/// Lower-cases header names and replaces sensitive values, keeping arrival order.
pub fn redact_headers<'a, I>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    headers
        .into_iter()
        .map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            let value = if is_sensitive_key(&name) {
                REDACTED.to_string()
            } else {
                value.to_string()
            };
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credentials_but_keeps_routing_headers() {
        let headers = redact_headers([
            ("Authorization", "Bearer abc"),
            ("X-Acoriss-Signature", "sig"),
            ("Cookie", "sid=1"),
            ("Content-Type", "application/json"),
            ("X-Forwarded-For", "203.0.113.9"),
        ]);

        assert_eq!(
            headers,
            vec![
                ("authorization".to_string(), REDACTED.to_string()),
                ("x-acoriss-signature".to_string(), REDACTED.to_string()),
                ("cookie".to_string(), REDACTED.to_string()),
                ("content-type".to_string(), "application/json".to_string()),
                ("x-forwarded-for".to_string(), "203.0.113.9".to_string()),
            ]
        );
    }

    #[test]
    fn api_key_variants_are_sensitive() {
        assert!(is_sensitive_key("X-Api-Key"));
        assert!(is_sensitive_key("apikey"));
        assert!(!is_sensitive_key("user-agent"));
    }
}
