use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims minted by the gateway. `role` is authoritative for admin checks;
/// this service never loads user records of its own, and it only verifies
/// tokens, never issues them.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    #[serde(default)]
    pub(crate) role: Option<String>,
    pub(crate) exp: i64,
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::test_support;

    #[test]
    fn jwt_encode_decode_roundtrip() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let token = test_support::mint_token("user-1", Some("admin"), &settings, None);
        let claims = verify_token(&token, &settings).expect("claims");

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let token =
            test_support::mint_token("user-1", None, &settings, Some(Duration::minutes(-5)));

        assert!(verify_token(&token, &settings).is_err());
    }
}
