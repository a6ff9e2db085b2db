use sha2::{Digest, Sha256};
use url::Url;

use crate::config::AvatarConfig;

const PLAIN_BASE: &str = "http://www.gravatar.com/avatar/";
const SSL_BASE: &str = "https://secure.gravatar.com/avatar/";

/// Builds Gravatar image URLs for commenters.
#[derive(Debug, Clone)]
pub struct Gravatar {
    size: u32,
    rating: String,
    default_image: String,
    use_ssl: bool,
}

impl Gravatar {
    pub fn new(config: &AvatarConfig) -> Self {
        Self {
            size: config.size,
            rating: config.rating.clone(),
            default_image: config.default_image.clone(),
            use_ssl: config.use_ssl,
        }
    }

    pub fn url(&self, email: &str) -> String {
        let base = if self.use_ssl { SSL_BASE } else { PLAIN_BASE };
        let path = format!("{}{}", base, email_hash(email));
        let size = self.size.to_string();
        let params = [
            ("s", size.as_str()),
            ("d", self.default_image.as_str()),
            ("r", self.rating.as_str()),
        ];

        match Url::parse_with_params(&path, &params) {
            Ok(url) => url.to_string(),
            Err(_) => path,
        }
    }
}

fn email_hash(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
