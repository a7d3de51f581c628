use std::collections::HashMap;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    /// Display name used in greetings.
    pub name: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Username received, waiting for the password.
    Pending,
    Authenticated { name: String },
    Rejected,
}

impl AuthStatus {
    pub fn into_result(self) -> Result<String> {
        match self {
            AuthStatus::Authenticated { name } => Ok(name),
            AuthStatus::Rejected => Err(AppError::Auth("wrong username or password".into())),
            AuthStatus::Pending => Err(AppError::Auth("password not entered yet".into())),
        }
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn authenticate(
    users: &HashMap<String, Credential>,
    username: &str,
    password: &str,
) -> AuthStatus {
    if password.is_empty() {
        return AuthStatus::Pending;
    }
    let Some(credential) = users.get(username.trim()) else {
        log::info!("Login attempt for unknown user {:?}", username);
        return AuthStatus::Rejected;
    };

    if credential.password_sha256.eq_ignore_ascii_case(&hash_password(password)) {
        AuthStatus::Authenticated {
            name: credential.name.clone(),
        }
    } else {
        log::info!("Wrong password for user {:?}", username);
        AuthStatus::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> HashMap<String, Credential> {
        let mut users = HashMap::new();
        users.insert(
            "ada".to_string(),
            Credential {
                name: "Ada Lovelace".to_string(),
                password_sha256: hash_password("engine"),
            },
        );
        users
    }

    #[test]
    fn test_hash_password_known_vector() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_correct_password_authenticates() {
        let status = authenticate(&users(), "ada", "engine");
        assert_eq!(
            status,
            AuthStatus::Authenticated {
                name: "Ada Lovelace".into()
            }
        );
        assert_eq!(status.into_result().unwrap(), "Ada Lovelace");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let status = authenticate(&users(), "ada", "Engine");
        assert_eq!(status, AuthStatus::Rejected);
        assert!(matches!(status.into_result(), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_unknown_user_rejected() {
        assert_eq!(authenticate(&users(), "babbage", "engine"), AuthStatus::Rejected);
    }

    #[test]
    fn test_empty_password_stays_pending() {
        let status = authenticate(&users(), "ada", "");
        assert_eq!(status, AuthStatus::Pending);
        assert!(status.into_result().is_err());
    }
}
