use crate::application_port::AuthError;
use crate::domain_model::{SessionId, SessionToken};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

/// Binds session ids to the server's `SECRET_KEY` so clients cannot mint
/// ids of their own.
pub struct SessionSigner {
    key: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret_key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: secret_key.into(),
        }
    }

    fn mac(&self, id: &str) -> anyhow::Result<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)?;
        mac.update(id.as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, id: &SessionId) -> Result<SessionToken, AuthError> {
        let id = id.to_string();
        let signature = self
            .mac(&id)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .finalize()
            .into_bytes();
        Ok(SessionToken(format!("{}.{}", id, hex::encode(signature))))
    }

    /// `None` for anything that is not a token this key produced.
    pub fn verify(&self, token: &str) -> Option<SessionId> {
        let (id, signature) = token.split_once('.')?;
        let signature = hex::decode(signature).ok()?;
        self.mac(id).ok()?.verify_slice(&signature).ok()?;
        id.parse::<SessionId>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_own_tokens() {
        let signer = SessionSigner::new("k1");
        let id = SessionId::generate();
        let token = signer.sign(&id).unwrap();
        assert_eq!(signer.verify(&token.0), Some(id));
    }

    #[test]
    fn rejects_foreign_or_tampered_tokens() {
        let signer = SessionSigner::new("k1");
        let other = SessionSigner::new("k2");
        let id = SessionId::generate();

        let foreign = other.sign(&id).unwrap();
        assert_eq!(signer.verify(&foreign.0), None);

        let token = signer.sign(&id).unwrap();
        let forged = format!("{}.{}", SessionId::generate(), token.0.split_once('.').unwrap().1);
        assert_eq!(signer.verify(&forged), None);

        assert_eq!(signer.verify(&id.to_string()), None);
        assert_eq!(signer.verify(""), None);
        assert_eq!(signer.verify("not-a-uuid.zz"), None);
    }
}
