use std::sync::Arc;

use chrono::Utc;

use carshop_auth::{ChangePassword, PasswordHasher, RegisterUser, User};
use carshop_core::{DomainError, DomainResult, ExpectedVersion, Login};
use carshop_observability::{Observer, ServiceEvent};

use super::ServiceResult;
use crate::store::UserRepository;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    observer: Arc<dyn Observer>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            users,
            hasher,
            observer,
        }
    }

    /// Create an account. Login and mail must both be unused.
    pub async fn register(&self, cmd: RegisterUser) -> ServiceResult<User> {
        let login = cmd.login.clone();
        if self.users.find_by_login(&login).await?.is_some() {
            return Err(DomainError::conflict(format!("User with login - {login} already exists")).into());
        }
        let user = User::register(cmd, self.hasher.as_ref(), Utc::now())?;
        if self.users.find_by_mail(&user.mail).await?.is_some() {
            return Err(
                DomainError::conflict(format!("User with mail - {} already exists", user.mail)).into(),
            );
        }

        let user = self.users.save(user, ExpectedVersion::New).await?;
        self.transitioned(&user.login, "register");
        Ok(user)
    }

    pub async fn find(&self, login: &Login) -> ServiceResult<User> {
        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User with login - {login} not found")))?;
        Ok(user)
    }

    pub async fn change_password(&self, login: &Login, cmd: ChangePassword) -> ServiceResult<User> {
        self.mutate(login, "change_password", |u| {
            u.change_password(&cmd, self.hasher.as_ref())
        })
        .await
    }

    pub async fn block(&self, login: &Login) -> ServiceResult<User> {
        self.mutate(login, "block", User::block).await
    }

    pub async fn restore(&self, login: &Login) -> ServiceResult<User> {
        self.mutate(login, "restore", User::restore).await
    }

    async fn mutate(
        &self,
        login: &Login,
        action: &'static str,
        transition: impl FnOnce(&mut User) -> DomainResult<()>,
    ) -> ServiceResult<User> {
        let mut user = self.find(login).await?;
        let expected = ExpectedVersion::Exact(user.version);
        transition(&mut user)?;
        let user = self.users.save(user, expected).await?;
        self.transitioned(&user.login, action);
        Ok(user)
    }

    fn transitioned(&self, login: &Login, action: &'static str) {
        self.observer.record(ServiceEvent::Transitioned {
            entity: "user",
            id: login.to_string(),
            action,
            actor: login.to_string(),
        });
    }
}
