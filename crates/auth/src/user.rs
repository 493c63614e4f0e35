//! Registered shop users.
//!
//! A user owns listings by reference only; blocking a user never touches their
//! products, it only stops them from creating new ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carshop_core::{DomainError, DomainResult, Entity, Login};

use crate::password::PasswordHasher;

pub const MIN_PASSWORD_LEN: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: register a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub login: Login,
    pub mail: String,
    pub password: String,
}

/// Command: change the caller's own password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: Login,
    pub mail: String,
    pub password_hash: String,
    pub blocked: bool,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
    pub version: u64,
}

impl User {
    /// Validate the command and build an active, unblocked account.
    ///
    /// Uniqueness of login and mail is a store-level check done by the caller.
    pub fn register(
        cmd: RegisterUser,
        hasher: &dyn PasswordHasher,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mail = normalize_mail(&cmd.mail)?;
        validate_password(&cmd.password)?;

        Ok(Self {
            login: cmd.login,
            mail,
            password_hash: hasher.hash(&cmd.password),
            blocked: false,
            active: true,
            registered_at: now,
            version: 1,
        })
    }

    pub fn change_password(
        &mut self,
        cmd: &ChangePassword,
        hasher: &dyn PasswordHasher,
    ) -> DomainResult<()> {
        if !hasher.verify(&cmd.old_password, &self.password_hash) {
            return Err(DomainError::unauthorized("old password does not match"));
        }
        validate_password(&cmd.new_password)?;
        self.password_hash = hasher.hash(&cmd.new_password);
        self.version += 1;
        Ok(())
    }

    pub fn block(&mut self) -> DomainResult<()> {
        if self.blocked {
            return Err(DomainError::conflict(format!(
                "user {} is already blocked",
                self.login
            )));
        }
        self.blocked = true;
        self.version += 1;
        Ok(())
    }

    pub fn restore(&mut self) -> DomainResult<()> {
        if !self.blocked {
            return Err(DomainError::conflict(format!(
                "user {} is not blocked",
                self.login
            )));
        }
        self.blocked = false;
        self.version += 1;
        Ok(())
    }

    /// Blocked or inactive accounts cannot create listings.
    pub fn ensure_can_transact(&self) -> DomainResult<()> {
        if self.blocked {
            return Err(DomainError::unauthorized(format!(
                "user {} is blocked",
                self.login
            )));
        }
        if !self.active {
            return Err(DomainError::unauthorized(format!(
                "user {} is not active",
                self.login
            )));
        }
        Ok(())
    }
}

impl Entity for User {
    type Id = Login;

    fn id(&self) -> &Self::Id {
        &self.login
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn normalize_mail(mail: &str) -> DomainResult<String> {
    let mail = mail.trim();
    match mail.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(mail.to_string())
        }
        _ => Err(DomainError::validation(format!("invalid mail address: {mail}"))),
    }
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::SaltedSha256Hasher;

    fn register(login: &str, mail: &str, password: &str) -> DomainResult<User> {
        User::register(
            RegisterUser {
                login: Login::parse(login).unwrap(),
                mail: mail.to_string(),
                password: password.to_string(),
            },
            &SaltedSha256Hasher,
            Utc::now(),
        )
    }

    #[test]
    fn register_hashes_password_and_starts_active() {
        let user = register("alice", " alice@example.com ", "correct horse").unwrap();
        assert_eq!(user.mail, "alice@example.com");
        assert_ne!(user.password_hash, "correct horse");
        assert!(user.active);
        assert!(!user.blocked);
        assert!(user.ensure_can_transact().is_ok());
    }

    #[test]
    fn register_validates_mail_and_password() {
        for mail in ["alice", "@example.com", "alice@", "a@b@c"] {
            assert!(
                matches!(register("alice", mail, "long enough"), Err(DomainError::Validation(_))),
                "{mail} should be rejected"
            );
        }
        assert!(matches!(
            register("alice", "alice@example.com", "short"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn change_password_requires_old_password() {
        let mut user = register("alice", "alice@example.com", "first-pass").unwrap();
        let err = user
            .change_password(
                &ChangePassword {
                    old_password: "wrong-pass".to_string(),
                    new_password: "second-pass".to_string(),
                },
                &SaltedSha256Hasher,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let err = user
            .change_password(
                &ChangePassword {
                    old_password: "first-pass".to_string(),
                    new_password: "tiny".to_string(),
                },
                &SaltedSha256Hasher,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        user.change_password(
            &ChangePassword {
                old_password: "first-pass".to_string(),
                new_password: "second-pass".to_string(),
            },
            &SaltedSha256Hasher,
        )
        .unwrap();
        assert!(SaltedSha256Hasher.verify("second-pass", &user.password_hash));
        assert_eq!(user.version, 2);
    }

    #[test]
    fn block_and_restore_toggle_once() {
        let mut user = register("alice", "alice@example.com", "first-pass").unwrap();
        user.block().unwrap();
        assert!(matches!(user.block(), Err(DomainError::Conflict(_))));
        assert!(matches!(user.ensure_can_transact(), Err(DomainError::Unauthorized(_))));

        user.restore().unwrap();
        assert!(matches!(user.restore(), Err(DomainError::Conflict(_))));
        assert!(user.ensure_can_transact().is_ok());
    }

    #[test]
    fn inactive_users_cannot_transact() {
        let mut user = register("alice", "alice@example.com", "first-pass").unwrap();
        user.active = false;
        assert!(matches!(user.ensure_can_transact(), Err(DomainError::Unauthorized(_))));
    }
}
