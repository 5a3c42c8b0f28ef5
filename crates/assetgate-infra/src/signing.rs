//! Signed URLs
//!
//! Wire format: `/files/{path}?expires={unix}&signature={hex}` where the
//! signature is HMAC-SHA256 over `"{path}:{expires}"`. Verification is
//! stateless.

use assetgate_core::UploadError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const URL_PREFIX: &str = "/files/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Signed URL expired")]
    UrlExpired,

    #[error("Signature does not match")]
    SignatureInvalid,

    #[error("Path cannot be signed: {0}")]
    InvalidPath(String),

    #[error("Malformed signed URL: {0}")]
    Malformed(String),

    #[error("Signing key rejected")]
    InvalidKey,
}

impl From<SigningError> for UploadError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::UrlExpired => UploadError::UrlExpired,
            SigningError::SignatureInvalid | SigningError::Malformed(_) => {
                UploadError::SignatureInvalid
            }
            SigningError::InvalidPath(msg) => UploadError::InvalidRequest(msg),
            SigningError::InvalidKey => UploadError::Internal("Signing key rejected".to_string()),
        }
    }
}

/// A signed access URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub path: String,
    /// Unix seconds; valid while `now <= expires`
    pub expires: i64,
    /// Lowercase hex HMAC-SHA256
    pub signature: String,
}

impl SignedUrl {
    /// Parse the wire format back into its parts.
    pub fn parse(url: &str) -> Result<Self, SigningError> {
        let rest = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| SigningError::Malformed("missing /files/ prefix".to_string()))?;
        let (path, query) = rest
            .split_once('?')
            .ok_or_else(|| SigningError::Malformed("missing query".to_string()))?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => {
                    expires = Some(value.parse::<i64>().map_err(|_| {
                        SigningError::Malformed(format!("bad expires value {}", value))
                    })?);
                }
                Some(("signature", value)) => signature = Some(value.to_string()),
                _ => {}
            }
        }

        match (expires, signature) {
            (Some(expires), Some(signature)) if !path.is_empty() => Ok(Self {
                path: path.to_string(),
                expires,
                signature,
            }),
            _ => Err(SigningError::Malformed(
                "expires and signature are required".to_string(),
            )),
        }
    }
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}?expires={}&signature={}",
            URL_PREFIX, self.path, self.expires, self.signature
        )
    }
}

/// Issues and verifies signed URLs with one shared secret
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn sign(&self, path: &str, ttl: Duration) -> Result<SignedUrl, SigningError> {
        self.sign_at(path, ttl, chrono::Utc::now().timestamp())
    }

    pub fn sign_at(&self, path: &str, ttl: Duration, now: i64) -> Result<SignedUrl, SigningError> {
        check_path(path)?;
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| SigningError::Malformed("ttl out of range".to_string()))?;
        let expires = now.saturating_add(ttl_secs);
        let signature = self.signature(path, expires)?;

        Ok(SignedUrl {
            path: path.to_string(),
            expires,
            signature,
        })
    }

    pub fn verify(&self, path: &str, expires: i64, signature: &str) -> Result<(), SigningError> {
        self.verify_at(path, expires, signature, chrono::Utc::now().timestamp())
    }

    /// Expiry is checked before the signature.
    pub fn verify_at(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), SigningError> {
        if now > expires {
            tracing::debug!(path = %path, expires = expires, now = now, "Signed URL expired");
            return Err(SigningError::UrlExpired);
        }

        if !is_signature_shaped(signature) {
            tracing::debug!(path = %path, "Signed URL signature is not 64 lowercase hex digits");
            return Err(SigningError::SignatureInvalid);
        }

        let expected = self.signature(path, expires)?;
        if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            Ok(())
        } else {
            tracing::debug!(path = %path, "Signed URL signature mismatch");
            Err(SigningError::SignatureInvalid)
        }
    }

    /// Parse and verify a signed URL; returns the signed path.
    pub fn verify_url(&self, url: &str) -> Result<String, SigningError> {
        let signed = SignedUrl::parse(url)?;
        self.verify(&signed.path, signed.expires, &signed.signature)?;
        Ok(signed.path)
    }

    fn signature(&self, path: &str, expires: i64) -> Result<String, SigningError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SigningError::InvalidKey)?;
        mac.update(format!("{}:{}", path, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn is_signature_shaped(signature: &str) -> bool {
    signature.len() == 64
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn check_path(path: &str) -> Result<(), SigningError> {
    if path.is_empty()
        || path.starts_with('/')
        || path.contains("..")
        || path.contains(['?', '&', '#'])
    {
        return Err(SigningError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const PATH: &str = "vehicles/42/2026/03/vehicle_42_20260307_140509_0123456789abcdef.jpg";

    fn signer() -> UrlSigner {
        UrlSigner::new(SECRET)
    }

    #[test]
    fn test_signature_shape() {
        let signed = signer().sign_at("a.jpg", Duration::from_secs(0), 100).unwrap();
        assert_eq!(signed.expires, 100);
        assert_eq!(signed.signature.len(), 64);
        assert!(signed
            .signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signed = signer().sign_at(PATH, Duration::from_secs(3600), 1_000).unwrap();
        assert_eq!(signed.expires, 4_600);
        assert!(signer()
            .verify_at(PATH, signed.expires, &signed.signature, 4_600)
            .is_ok());
    }

    #[test]
    fn test_expired_is_reported_before_signature() {
        let signed = signer().sign_at(PATH, Duration::from_secs(60), 1_000).unwrap();
        assert_eq!(
            signer().verify_at(PATH, signed.expires, "bogus", 1_061),
            Err(SigningError::UrlExpired)
        );
    }

    #[test]
    fn test_single_character_tamper() {
        let signed = signer().sign_at(PATH, Duration::from_secs(60), 1_000).unwrap();

        let mut tampered_path = PATH.to_string();
        tampered_path.replace_range(0..1, "w");
        assert_eq!(
            signer().verify_at(&tampered_path, signed.expires, &signed.signature, 1_000),
            Err(SigningError::SignatureInvalid)
        );

        let mut tampered_sig = signed.signature.clone();
        let last = if tampered_sig.ends_with('0') { "1" } else { "0" };
        tampered_sig.replace_range(63..64, last);
        assert_eq!(
            signer().verify_at(PATH, signed.expires, &tampered_sig, 1_000),
            Err(SigningError::SignatureInvalid)
        );

        assert_eq!(
            signer().verify_at(PATH, signed.expires + 1, &signed.signature, 1_000),
            Err(SigningError::SignatureInvalid)
        );
    }

    #[test]
    fn test_signature_case_is_significant() {
        let signed = signer().sign_at(PATH, Duration::from_secs(60), 1_000).unwrap();
        let at = signed
            .signature
            .find(|c: char| c.is_ascii_alphabetic())
            .expect("a 64 digit hex signature contains a letter");
        let mut upper = signed.signature.clone();
        upper.replace_range(at..at + 1, &signed.signature[at..at + 1].to_ascii_uppercase());

        assert_eq!(
            signer().verify_at(PATH, signed.expires, &upper, 1_000),
            Err(SigningError::SignatureInvalid)
        );
        assert_eq!(
            signer().verify_at(PATH, signed.expires, &signed.signature.to_ascii_uppercase(), 1_000),
            Err(SigningError::SignatureInvalid)
        );
    }

    #[test]
    fn test_signature_must_be_full_length_hex() {
        let signed = signer().sign_at(PATH, Duration::from_secs(60), 1_000).unwrap();
        for bad in [&signed.signature[..63], "", "zz"] {
            assert_eq!(
                signer().verify_at(PATH, signed.expires, bad, 1_000),
                Err(SigningError::SignatureInvalid)
            );
        }
        let padded = format!("{}0", signed.signature);
        assert_eq!(
            signer().verify_at(PATH, signed.expires, &padded, 1_000),
            Err(SigningError::SignatureInvalid)
        );
    }

    #[test]
    fn test_other_secret_rejects() {
        let signed = signer().sign_at(PATH, Duration::from_secs(60), 1_000).unwrap();
        let other = UrlSigner::new("ffffffffffffffffffffffffffffffff");
        assert_eq!(
            other.verify_at(PATH, signed.expires, &signed.signature, 1_000),
            Err(SigningError::SignatureInvalid)
        );
    }

    #[test]
    fn test_wire_format() {
        let signed = signer().sign_at("a/b.jpg", Duration::from_secs(10), 5).unwrap();
        let url = signed.to_string();
        assert_eq!(
            url,
            format!("/files/a/b.jpg?expires=15&signature={}", signed.signature)
        );
        assert_eq!(SignedUrl::parse(&url).unwrap(), signed);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(SignedUrl::parse("/other/a.jpg?expires=1&signature=ab").is_err());
        assert!(SignedUrl::parse("/files/a.jpg").is_err());
        assert!(SignedUrl::parse("/files/a.jpg?expires=soon&signature=ab").is_err());
        assert!(SignedUrl::parse("/files/a.jpg?expires=1").is_err());

        let err: UploadError = SignedUrl::parse("/files/x").unwrap_err().into();
        assert_eq!(err.kind(), "SignatureInvalidError");
    }

    #[test]
    fn test_unsignable_paths() {
        for path in ["", "/abs.jpg", "a/../b.jpg", "a.jpg?x=1", "a&b", "a#b"] {
            assert!(matches!(
                signer().sign_at(path, Duration::from_secs(1), 0),
                Err(SigningError::InvalidPath(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_one_second_ttl_expires() {
        let signed = signer().sign(PATH, Duration::from_secs(1)).unwrap();
        assert!(signer().verify_url(&signed.to_string()).is_ok());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            signer().verify_url(&signed.to_string()),
            Err(SigningError::UrlExpired)
        );
    }
}
