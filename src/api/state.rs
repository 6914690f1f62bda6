//! Application state shared by every handler

use std::sync::Arc;

use crate::domain::auth::AuthMode;
use crate::infrastructure::auth::Authenticator;
use crate::infrastructure::model::ModelRepository;
use crate::infrastructure::session::SessionService;
use crate::infrastructure::token::TokenService;
use crate::infrastructure::user::UserService;

#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelRepository>,
    pub authenticator: Arc<Authenticator>,
    pub tokens: Arc<TokenService>,
    pub sessions: Arc<SessionService>,
    pub users: Arc<UserService>,
    /// Mode used when a login request does not name one
    pub default_auth_mode: AuthMode,
}
