use serde::{Deserialize, Serialize};

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Token pair returned by the login and refresh endpoints.
///
/// The refresh endpoint rotates the refresh token on most deployments but
/// older ones return only a new access token, so `refresh_token` is
/// optional here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Short-lived bearer token attached to authorized requests.
    pub access_token: String,

    /// Long-lived token used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Always `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl TokenResponse {
    /// Creates a new token response.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        TokenResponse {
            access_token: access_token.into(),
            refresh_token,
            token_type: default_token_type(),
        }
    }
}
