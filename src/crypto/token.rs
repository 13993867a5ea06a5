use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};
use crate::models::session::SessionClaims;

/// Issues and verifies session tokens.
///
/// Format: `base64url(json claims) "." base64url(blake3_keyed(json claims))`.
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<Zeroizing<[u8; 32]>>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(key: Zeroizing<[u8; 32]>, ttl: Duration) -> Self {
        Self {
            key: Arc::new(key),
            ttl,
        }
    }

    /// The lifetime of newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self, payload: &[u8]) -> [u8; 32] {
        *blake3::keyed_hash(&self.key, payload).as_bytes()
    }

    /// Builds claims for `subject` expiring `ttl` after `now`.
    pub fn claims_for(
        &self,
        subject: &str,
        role_id: &str,
        menu_access: std::collections::BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> SessionClaims {
        SessionClaims {
            subject: subject.to_string(),
            role_id: role_id.to_string(),
            menu_access,
            issued_at: now,
            expires_at: now + self.ttl,
        }
    }

    /// Serializes and signs the claims.
    pub fn issue(&self, claims: &SessionClaims) -> Result<String> {
        let payload = sonic_rs::to_vec(claims)
            .map_err(|e| AppError::Internal(format!("Token serialization failed: {}", e)))?;
        let signature = self.mac(&payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Checks the signature and expiry and returns the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
        let invalid = || AppError::Authentication("Invalid token".to_string());

        let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(invalid)?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|_| invalid())?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|_| invalid())?;

        let expected = self.mac(&payload);
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(invalid());
        }

        let claims: SessionClaims = sonic_rs::from_slice(&payload).map_err(|_| invalid())?;

        if now >= claims.expires_at {
            return Err(AppError::Authentication("Token expired".to_string()));
        }

        Ok(claims)
    }
}
