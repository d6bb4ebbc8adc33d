use super::{AccountId, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A registered user's profile. Funds live in the [`super::account::Account`]
/// sharing the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub is_admin: bool,
}

impl UserProfile {
    pub fn identity(&self) -> Identity {
        Identity {
            account: self.id,
            is_admin: self.is_admin,
        }
    }
}

/// The caller identity resolved by the session layer.
///
/// The core trusts this as given and performs no credential checks itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account: AccountId,
    pub is_admin: bool,
}

/// Hex-encoded SHA-256 digest of a raw password.
pub fn hash_password(raw: &str) -> String {
    Sha256::digest(raw.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_stable_hex() {
        let hash = hash_password("password123");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_password("password123"));
        assert_ne!(hash, hash_password("password124"));
    }

    #[test]
    fn test_identity_carries_admin_flag() {
        let user = UserProfile {
            id: 3,
            username: "emil".to_string(),
            password_hash: hash_password("password123"),
            email: "emil@domain.com".to_string(),
            is_admin: false,
        };
        assert_eq!(user.identity().account, 3);
        assert!(!user.identity().is_admin);
    }
}
