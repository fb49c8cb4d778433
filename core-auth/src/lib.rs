//! # Authentication
//!
//! OAuth 2.0 installed-app credentials for the Google Drive and Google Photos
//! Library APIs: client secrets parsing, PKCE authorization flow, token
//! refresh and on-disk token persistence.

pub mod credentials;
pub mod error;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use credentials::{
    CredentialProvider, InstalledAppCredentials, SharedAccessToken, StaticCredentials,
};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::TokenStore;
pub use types::{
    ClientSecrets, OAuthTokens, EXPIRY_SKEW_SECONDS, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL,
    TRANSFER_SCOPES,
};
