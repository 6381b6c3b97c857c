use sha2::{Digest, Sha256};

/// Gravatar URL for an already-normalized email: 200px, pg rating, mystery-man fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}
