use carshop_core::Login;

/// Authenticated caller of a request, derived from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    login: Login,
}

impl PrincipalContext {
    pub fn new(login: Login) -> Self {
        Self { login }
    }

    pub fn login(&self) -> &Login {
        &self.login
    }
}
