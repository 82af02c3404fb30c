//! Signed token utilities using HS256.
//!
//! Two token kinds are issued from the same process-wide secret:
//! applicant session tokens and guarantor invitation tokens. Each carries a
//! `token_type` claim so one kind can never be accepted as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Kind of signed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Session,
    GuarantorInvite,
}

/// Claims of an applicant session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Applicant ID
    pub sub: String,
    /// Password version at issue time; a reset bumps it and retires the token
    pub pwv: i32,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: TokenType,
}

/// Claims of a guarantor invitation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationClaims {
    /// Inviting applicant ID
    pub sub: String,
    /// Invited guarantor email
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: TokenType,
}

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_EXPIRY_SECS: i64 = 86_400;

/// Signing configuration shared by every token kind.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    pub session_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("session_expiry_secs", &self.session_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Creates a config from a shared secret with no clock-skew leeway.
    pub fn new(secret: &str, session_expiry_secs: i64) -> Result<Self, JwtError> {
        Self::with_leeway(secret, session_expiry_secs, 0)
    }

    /// Creates a config from a shared secret with custom leeway.
    pub fn with_leeway(
        secret: &str,
        session_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("secret must not be empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_expiry_secs,
            leeway_secs,
        })
    }

    /// Issues a session token for an applicant.
    pub fn issue_session_token(
        &self,
        applicant_id: Uuid,
        password_version: i32,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: applicant_id.to_string(),
            pwv: password_version,
            exp: (now + Duration::seconds(self.session_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Session,
        };
        self.sign(&claims)
    }

    /// Validates a session token and returns its claims.
    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let claims: SessionClaims = self.verify(token, self.leeway_secs)?;
        if claims.token_type != TokenType::Session {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }

    /// Issues an invitation token binding an applicant to an invited email.
    ///
    /// A negative `ttl` produces an already expired token.
    pub fn issue_invitation_token(
        &self,
        applicant_id: Uuid,
        email: &str,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = InvitationClaims {
            sub: applicant_id.to_string(),
            email: email.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::GuarantorInvite,
        };
        self.sign(&claims)
    }

    /// Validates an invitation token and returns its claims.
    ///
    /// No leeway applies: a token stops working at the same instant its
    /// stored invitation becomes eligible for expiry.
    pub fn validate_invitation_token(&self, token: &str) -> Result<InvitationClaims, JwtError> {
        let claims: InvitationClaims = self.verify(token, 0)?;
        if claims.token_type != TokenType::GuarantorInvite {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str, leeway_secs: u64) -> Result<C, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;

        decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}

/// Parses the applicant ID out of a token subject.
pub fn extract_applicant_id(sub: &str) -> Result<Uuid, JwtError> {
    Uuid::parse_str(sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough-0123";

    fn config() -> JwtConfig {
        JwtConfig::new(SECRET, DEFAULT_SESSION_EXPIRY_SECS).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtConfig::new("", 60),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_session_token_roundtrip() {
        let jwt = config();
        let id = Uuid::new_v4();

        let token = jwt.issue_session_token(id, 3).unwrap();
        let claims = jwt.validate_session_token(&token).unwrap();

        assert_eq!(extract_applicant_id(&claims.sub).unwrap(), id);
        assert_eq!(claims.pwv, 3);
        assert_eq!(claims.token_type, TokenType::Session);
        assert_eq!(claims.exp - claims.iat, DEFAULT_SESSION_EXPIRY_SECS);
    }

    #[test]
    fn test_invitation_token_carries_email() {
        let jwt = config();
        let id = Uuid::new_v4();

        let token = jwt
            .issue_invitation_token(id, "guarantor@example.com", Duration::days(7))
            .unwrap();
        let claims = jwt.validate_invitation_token(&token).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "guarantor@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 86_400);
    }

    #[test]
    fn test_invitation_tokens_are_unique() {
        let jwt = config();
        let id = Uuid::new_v4();

        let a = jwt
            .issue_invitation_token(id, "g@example.com", Duration::days(7))
            .unwrap();
        let b = jwt
            .issue_invitation_token(id, "g@example.com", Duration::days(7))
            .unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_invitation_token() {
        let jwt = config();
        let token = jwt
            .issue_invitation_token(Uuid::new_v4(), "g@example.com", Duration::hours(-1))
            .unwrap();

        assert!(matches!(
            jwt.validate_invitation_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_leeway_applies_to_sessions_only() {
        let jwt = JwtConfig::with_leeway(SECRET, -10, 120).unwrap();

        let session = jwt.issue_session_token(Uuid::new_v4(), 1).unwrap();
        assert!(jwt.validate_session_token(&session).is_ok());

        let invitation = jwt
            .issue_invitation_token(Uuid::new_v4(), "g@example.com", Duration::seconds(-10))
            .unwrap();
        assert!(matches!(
            jwt.validate_invitation_token(&invitation),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let jwt = config();
        let token = jwt.issue_session_token(Uuid::new_v4(), 1).unwrap();
        let tampered = format!("{}x", token);

        assert!(matches!(
            jwt.validate_session_token(&tampered),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_foreign_secret_is_invalid() {
        let other = JwtConfig::new("another-secret-entirely-different-0000", 60).unwrap();
        let token = other.issue_session_token(Uuid::new_v4(), 1).unwrap();

        assert!(matches!(
            config().validate_session_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_session_token_rejected_as_invitation() {
        let jwt = config();
        let token = jwt.issue_session_token(Uuid::new_v4(), 1).unwrap();

        assert!(matches!(
            jwt.validate_invitation_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            config().validate_invitation_token("not-a-token"),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_extract_applicant_id_rejects_non_uuid() {
        assert!(extract_applicant_id("abc").is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(SECRET));
    }
}
