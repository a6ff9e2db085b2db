/// Hash a password with a fresh random salt.
pub fn hash(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Check a candidate password against a stored digest. A malformed digest
/// never matches.
pub fn verify(digest: &str, candidate: &str) -> bool {
    bcrypt::verify(candidate, digest).unwrap_or(false)
}
