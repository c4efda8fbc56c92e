use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Unverified JWT payload. Only used for local decisions (expiry display and
/// skipping a doomed profile request); the server remains the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_unix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decode_reads_subject_and_expiry() {
        let token = token_with_payload(r#"{"sub":"ada@example.com","exp":1700000000}"#);
        let claims = TokenClaims::decode(&token).expect("claims should decode");
        assert_eq!(claims.sub.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert!(claims.is_expired_at(1_700_000_000));
        assert!(!claims.is_expired_at(1_699_999_999));
    }

    #[test]
    fn opaque_tokens_have_no_claims() {
        assert_eq!(TokenClaims::decode("opaque-token"), None);
        assert_eq!(TokenClaims::decode("a.!!!.c"), None);
    }

    #[test]
    fn missing_expiry_never_expires() {
        let token = token_with_payload(r#"{"sub":"ada@example.com"}"#);
        let claims = TokenClaims::decode(&token).expect("claims should decode");
        assert!(!claims.is_expired_at(i64::MAX));
    }
}
