use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn token(sub: &str, role: &str, exp: usize, secret: &str) -> String {
    let claims = AccessClaims {
        sub: sub.to_string(),
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_validate_access_token_success() {
    let jwt = token("42", "seller", 9999999999, SECRET);

    let claims = validate_access_token(&jwt, SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, "42");
    assert_eq!(claims.role, "seller");
}

#[test]
fn test_validate_access_token_expired() {
    let jwt = token("42", "seller", 1, SECRET);
    assert!(validate_access_token(&jwt, SECRET).is_err());
}

#[test]
fn test_validate_access_token_invalid_signature() {
    let jwt = token("42", "seller", 9999999999, "wrongsecret");
    assert!(validate_access_token(&jwt, SECRET).is_err());
}

#[test]
fn test_authenticate_parses_numeric_subject() {
    let header = format!("Bearer {}", token("42", "admin", 9999999999, SECRET));

    let user = authenticate(Some(&header), SECRET).unwrap();
    assert_eq!(user.user_id, 42);
    assert!(user.is_admin());
}

#[test]
fn test_authenticate_rejects_non_numeric_subject() {
    let header = format!(
        "Bearer {}",
        token("123e4567-e89b-12d3-a456-426614174000", "seller", 9999999999, SECRET)
    );

    let err = authenticate(Some(&header), SECRET).unwrap_err();
    assert_eq!(err.to_string(), "Invalid user ID in token");
}

#[test]
fn test_authenticate_requires_bearer_scheme() {
    assert!(authenticate(None, SECRET).is_err());

    let jwt = token("42", "seller", 9999999999, SECRET);
    let err = authenticate(Some(&format!("Token {jwt}")), SECRET).unwrap_err();
    assert_eq!(err.to_string(), "Invalid Authorization header format");
}
