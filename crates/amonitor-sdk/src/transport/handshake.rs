//! Bearer check applied to the upgrade request.
//!
//! The whole `Authorization` value must equal `Bearer <token>`; scheme case
//! and extra whitespace are not normalised. Comparison is constant-time.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use subtle::ConstantTimeEq;

use amonitor_core::error::{AmonitorError, Result};

#[derive(Debug, Clone)]
pub struct BearerAuth {
    expected: Option<String>,
}

impl BearerAuth {
    /// `None` (or an empty token) disables the check.
    pub fn new(token: Option<&str>) -> Self {
        Self {
            expected: token.filter(|t| !t.is_empty()).map(|t| format!("Bearer {t}")),
        }
    }

    pub fn required(&self) -> bool {
        self.expected.is_some()
    }

    pub fn verify(&self, headers: &HeaderMap) -> Result<()> {
        let Some(expected) = self.expected.as_deref() else {
            return Ok(());
        };
        let presented = headers
            .get(AUTHORIZATION)
            .map(|v| v.as_bytes())
            .unwrap_or_default();
        if bool::from(presented.ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(AmonitorError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(a) = auth {
            h.insert(AUTHORIZATION, HeaderValue::from_str(a).unwrap());
        }
        h
    }

    #[test]
    fn disabled_accepts_anything() {
        let auth = BearerAuth::new(None);
        assert!(!auth.required());
        assert!(auth.verify(&headers(None)).is_ok());
        assert!(auth.verify(&headers(Some("Bearer whatever"))).is_ok());

        assert!(!BearerAuth::new(Some("")).required());
    }

    #[test]
    fn exact_match_only() {
        let auth = BearerAuth::new(Some("s3cret"));
        assert!(auth.required());
        assert!(auth.verify(&headers(Some("Bearer s3cret"))).is_ok());

        for bad in [
            None,
            Some("Bearer wrong"),
            Some("bearer s3cret"),
            Some("s3cret"),
            Some("Bearer s3cret "),
        ] {
            let err = auth.verify(&headers(bad)).unwrap_err();
            assert_eq!(err.client_code().as_str(), "UNAUTHORIZED", "{bad:?}");
        }
    }
}
