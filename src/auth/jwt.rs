use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity, RawClaims};
use crate::config::JwtConfig;

/// Why a bearer token was refused. Callers map these to different statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token payload is incomplete")]
    IncompletePayload,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            // not issued by us, same trust outcome as a bad signature
            ErrorKind::InvalidIssuer => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(_) => TokenError::IncompletePayload,
            _ => TokenError::Malformed,
        }
    }
}

/// Holds JWT signing and verification keys with config data. Built once at
/// startup and shared by value.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::from_secs(u64::try_from(cfg.ttl_minutes).unwrap_or(0).saturating_mul(60)),
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, identity: &Identity, now: OffsetDateTime) -> anyhow::Result<String> {
        let ttl = TimeDuration::seconds(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX));
        let exp = now.checked_add(ttl).context("token expiry out of range")?;
        let claims = Claims {
            user_id: identity.user_id,
            user_uuid: identity.user_uuid,
            user_email: identity.user_email.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = identity.user_id, user_uuid = %identity.user_uuid, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        // expired means expired, no grace period
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss"]);
        let data = decode::<RawClaims>(token, &self.decoding, &validation)?;
        let claims = data
            .claims
            .into_claims()
            .ok_or(TokenError::IncompletePayload)?;
        debug!(user_id = claims.user_id, user_uuid = %claims.user_uuid, "jwt verified");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl_minutes: 5,
        })
    }

    fn identity() -> Identity {
        Identity {
            user_id: 42,
            user_uuid: Uuid::new_v4(),
            user_email: "a@b.com".into(),
        }
    }

    /// Replaces the char at `idx` with a different base64url char.
    fn mutate_at(token: &str, idx: usize) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", "test-issuer");
        let id = identity();
        let token = keys.issue(&id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.identity(), id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn verification_is_deterministic() {
        let keys = make_keys("dev-secret", "iss");
        let token = keys.issue(&identity()).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), keys.verify(&token).unwrap());
    }

    #[test]
    fn signature_mutation_never_verifies() {
        let keys = make_keys("dev-secret", "iss");
        let token = keys.issue(&identity()).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;
        for offset in [0, 5, 20] {
            let tampered = mutate_at(&token, sig_start + offset);
            assert_eq!(keys.verify(&tampered), Err(TokenError::InvalidSignature));
        }
        let last = token.len() - 1;
        assert!(keys.verify(&mutate_at(&token, last)).is_err());
    }

    #[test]
    fn payload_mutation_never_verifies() {
        let keys = make_keys("dev-secret", "iss");
        let token = keys.issue(&identity()).unwrap();
        let payload_start = token.find('.').unwrap() + 1;
        let tampered = mutate_at(&token, payload_start + 10);
        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = make_keys("secret-a", "iss").issue(&identity()).unwrap();
        let err = make_keys("secret-b", "iss").verify(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = make_keys("same", "good-iss").issue(&identity()).unwrap();
        assert!(make_keys("same", "bad-iss").verify(&token).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret", "iss");
        assert_eq!(keys.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(keys.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = make_keys("dev-secret", "iss");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.issue_at(&identity(), past).unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_is_expired_right_after_its_horizon() {
        let keys = make_keys("dev-secret", "iss");
        // ttl is 5 minutes, so this one lapsed 30 seconds ago
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(5 * 60 + 30);
        let token = keys.issue_at(&identity(), issued).unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));

        let fresh = OffsetDateTime::now_utc() - TimeDuration::seconds(5 * 60 - 30);
        let token = keys.issue_at(&identity(), fresh).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn oversized_ttl_fails_to_issue_instead_of_panicking() {
        let keys = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            ttl_minutes: i64::MAX,
        });
        assert!(keys.issue(&identity()).is_err());

        let negative = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            ttl_minutes: -10,
        });
        assert_eq!(negative.ttl, Duration::ZERO);
    }

    #[test]
    fn missing_identity_fields_are_incomplete() {
        #[derive(Serialize)]
        struct Partial {
            #[serde(rename = "userId")]
            user_id: i32,
            exp: i64,
            iss: String,
        }
        let keys = make_keys("dev-secret", "iss");
        let exp = (OffsetDateTime::now_utc() + TimeDuration::minutes(5)).unix_timestamp();
        let token = encode(
            &Header::default(),
            &Partial { user_id: 1, exp, iss: "iss".into() },
            &keys.encoding,
        )
        .unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::IncompletePayload));
    }

    #[test]
    fn missing_expiry_is_incomplete() {
        #[derive(Serialize)]
        struct NoExp {
            #[serde(rename = "userId")]
            user_id: i32,
            #[serde(rename = "userUuid")]
            user_uuid: Uuid,
            user_email: String,
            iss: String,
        }
        let keys = make_keys("dev-secret", "iss");
        let token = encode(
            &Header::default(),
            &NoExp {
                user_id: 1,
                user_uuid: Uuid::new_v4(),
                user_email: "a@b.com".into(),
                iss: "iss".into(),
            },
            &keys.encoding,
        )
        .unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::IncompletePayload));
    }
}
