use base64::Engine;
use jwt_simple::prelude::*;

/// Re-export the `RS256KeyPair` type from `jwt_simple` to ease loading
pub use jwt_simple::algorithms::RS256KeyPair;

/// Signs a key-pair JWT accepted by the SQL API.
///
/// `account_identifier` may be a full locator like `xy12345.us-east-1`;
/// only the part before the first dot goes into the claims.
pub fn create_token(
    key_pair: &RS256KeyPair,
    account_identifier: &str,
    user: &str,
) -> Result<String, KeyPairError> {
    let fingerprint = public_key_fingerprint(key_pair)?;
    let account = account_locator(account_identifier);
    let user = user.to_ascii_uppercase();
    let qualified_username = format!("{account}.{user}");
    let issuer = format!("{qualified_username}.SHA256:{fingerprint}");
    let claims = Claims::create(Duration::from_hours(1))
        .with_issuer(issuer)
        .with_subject(qualified_username);
    key_pair
        .sign(claims)
        .map_err(KeyPairError::KeyPairGeneration)
}

/// Parses a PKCS#8 PEM private key.
pub fn key_pair_from_pem(private_key: &str) -> Result<RS256KeyPair, KeyPairError> {
    RS256KeyPair::from_pem(private_key).map_err(KeyPairError::KeyPairGeneration)
}

fn public_key_fingerprint(key_pair: &RS256KeyPair) -> Result<String, KeyPairError> {
    let thumbprint = key_pair.public_key().sha256_thumbprint();
    // jwt-simple hands back url-safe base64 without padding, Snowflake wants the standard alphabet
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(thumbprint)
        .map_err(|e| KeyPairError::FingerprintGeneration(e.into()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(raw))
}

fn account_locator(account_identifier: &str) -> String {
    account_identifier
        .split('.')
        .next()
        .unwrap_or(account_identifier)
        .to_ascii_uppercase()
}

#[derive(thiserror::Error, Debug)]
pub enum KeyPairError {
    #[error("failed to generate fingerprint from public key: {0}")]
    FingerprintGeneration(anyhow::Error),
    #[error("failed to generate key pair from private key: {0}")]
    KeyPairGeneration(anyhow::Error),
}
