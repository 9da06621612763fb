//! Test data factories with sensible defaults.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::domain::entities::{
    identity::{Identity, IdentityUser, XRhIdentity},
    user::User,
};

pub const TEST_TOKEN_KEY: &str = include_str!("fixtures/token_key.pem");
pub const TEST_TOKEN_PUBLIC_KEY: &str = include_str!("fixtures/token_key.pub.pem");

/// Modulus and exponent of `TEST_TOKEN_PUBLIC_KEY`, base64url.
pub const TEST_JWK_N: &str = "itYg9dmZK88iZzSbwrRX7e7nFwQ20UGpi3apI0KRzAIRunDCu9H313UPtl1a7Y44_-lCrSjMZYnfJ4oLgk_qI6gAnIrARo1O97WKSfDohSBJ4VKszE-Qevv3bkrCF0geKlnxjZ0g_pL6YRuKDnATDbAGUHD-SjVNJ094ANqxKBhldSAvukoXpwf1HQ75Vug7lvPklUnwyct63QosKwQ3DRT7HSddTqzOSDCykei7hv_FRf_VczCLP_O4CYZI-qqjWGGPf5lHEpFz_0A82zbc7ULVl6sDR2s6ZAhFr4wTERqUVOLq29aB1fc9MWc9nOjMKPT2KGC4j3wf1GnEAnEmxQ";
pub const TEST_JWK_E: &str = "AQAB";

/// Create a directory user with the given id and admin flag.
pub fn create_test_user(id: &str, is_org_admin: bool) -> User {
    User {
        id: id.to_string(),
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        first_name: "Test".to_string(),
        last_name: format!("User{id}"),
        is_active: true,
        locale: "en_US".to_string(),
        org_id: "1234".to_string(),
        user_type: "User".to_string(),
        is_org_admin,
        ..Default::default()
    }
}

/// Create a caller identity; tweak it with the closure.
pub fn create_test_identity(overrides: impl FnOnce(&mut Identity)) -> Identity {
    let mut identity = Identity {
        org_id: "1234".to_string(),
        identity_type: "User".to_string(),
        user: IdentityUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            is_org_admin: true,
        },
    };
    overrides(&mut identity);
    identity
}

/// Base64 `x-rh-identity` header value for `identity`.
pub fn identity_header(identity: &Identity) -> String {
    let wrapped = XRhIdentity {
        identity: identity.clone(),
    };
    STANDARD.encode(serde_json::to_vec(&wrapped).unwrap())
}

/// JWK set publishing the test key under `kid`, next to an unrelated EC key.
pub fn test_jwks(kid: &str) -> serde_json::Value {
    serde_json::json!({
        "keys": [
            { "kty": "EC", "kid": "ec-1", "crv": "P-256", "x": "AA", "y": "AA" },
            { "kty": "RSA", "kid": kid, "use": "sig", "alg": "RS256", "n": TEST_JWK_N, "e": TEST_JWK_E }
        ]
    })
}
