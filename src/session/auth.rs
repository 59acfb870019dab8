use serde::{Deserialize, Serialize};

/// Errors from login and permission checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[error("Invalid user id or password")]
    InvalidCredentials,

    /// The identity may not perform the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May upload and delete study files and sees every study
    Admin,
    /// Sees studies matching the account prefix
    #[default]
    User,
}

/// A configured account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Login id
    pub id: String,
    /// Login password (stored as configured)
    pub password: String,
    /// Account role
    #[serde(default)]
    pub role: Role,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Study file name prefix visible to this account (e.g. "C01_")
    #[serde(default)]
    pub prefix: String,
}

/// The authenticated user of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Login id
    pub id: String,
    /// Display name (falls back to the id)
    pub name: String,
    /// Account role
    pub role: Role,
    /// Study file name prefix
    pub prefix: String,
}

impl Identity {
    /// True for administrators
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this identity may read a study file of the given name
    pub fn can_access(&self, file_name: &str) -> bool {
        self.is_admin() || file_name.starts_with(&self.prefix)
    }

    /// Fail unless the identity is an administrator
    pub fn require_admin(&self, action: &str) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "'{}' is not an administrator and may not {}",
                self.id, action
            )))
        }
    }
}

/// The set of accounts that may log in
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: Vec<UserAccount>,
}

impl UserDirectory {
    /// Create a directory from configured accounts
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True if no account is configured
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Check credentials and return the identity
    pub fn authenticate(&self, id: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.id == id && a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(Identity {
            id: account.id.clone(),
            name: account.name.clone().unwrap_or_else(|| account.id.clone()),
            role: account.role,
            prefix: account.prefix.clone(),
        })
    }
}
