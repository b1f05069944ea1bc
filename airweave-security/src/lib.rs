//! Outbound credential management for source connections: resolving
//! `auth_provider` connections to direct or proxied credentials, and
//! refreshing OAuth access tokens with refreshes serialized per
//! connection.

pub mod auth_provider;
pub mod credentials;
pub mod error;
pub mod persistence;
pub mod refresher;
pub mod token_manager;

pub mod prelude {
    pub use crate::auth_provider::{AuthProvider, AuthResolution};
    pub use crate::credentials::{Credentials, RefreshPolicy, RefreshedTokens};
    pub use crate::error::SecurityError;
    pub use crate::persistence::CredentialPersistence;
    pub use crate::refresher::{OAuth2Refresher, TokenRefresher};
    pub use crate::token_manager::TokenManager;
}
