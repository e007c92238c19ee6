use super::{check, Client};
use crate::entities::user::User;
use crate::Error;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Shown after signup instead of logging the user in.
pub const SIGNUP_CONFIRMATION: &str =
    "Ita-nia konta kria tiha ona ho susesu. Favór hare ita-nia email atu konfirma hodi bele halo login.";

const AUTH_FAILED: &str = "Authentication failed";
const GOOGLE_FAILED: &str = "Google authentication failed";
const GOOGLE_MISSING: &str = "Google authentication failed: missing credential.";
const GOOGLE_NO_EMAIL: &str = "Google authentication did not return a valid email.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str, name: Option<&str>) -> Self {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => local_part(email),
        };
        Credentials {
            email: email.trim().to_string(),
            name,
            password: password.to_string(),
        }
    }
}

fn local_part(email: &str) -> String {
    email.trim().split('@').next().unwrap_or_default().to_string()
}

/// Identity read from a Google ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
struct GoogleClaims {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    sub: Option<String>,
}

impl GoogleProfile {
    /// Decodes the payload segment of the token. The signature is checked by the backend.
    pub fn from_credential(credential: &str) -> Result<Self, Error> {
        let payload = credential
            .split('.')
            .nth(1)
            .filter(|payload| !payload.is_empty())
            .ok_or_else(|| Error::Credential(GOOGLE_MISSING.to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| Error::Credential(GOOGLE_FAILED.to_string()))?;
        let claims: GoogleClaims = serde_json::from_slice(&bytes)?;

        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| Error::Credential(GOOGLE_NO_EMAIL.to_string()))?;
        let name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| local_part(&email));
        Ok(GoogleProfile {
            email,
            name,
            image: claims.picture,
            provider_id: claims.sub,
        })
    }
}

#[derive(Serialize)]
struct AppleLogin<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Serialize)]
struct ProfileRequest<'a> {
    user_id: i64,
    #[serde(flatten)]
    update: &'a ProfileUpdate,
}

#[derive(Serialize)]
struct AccountRequest {
    user_id: i64,
}

impl Client {
    pub async fn login(&self, credentials: &Credentials) -> Result<User, Error> {
        let user = self.authenticate("login", credentials, AUTH_FAILED).await?;
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Creates the account. The user still has to confirm their e-mail, so the
    /// returned record is not a session.
    pub async fn signup(&self, credentials: &Credentials) -> Result<User, Error> {
        self.authenticate("signup", credentials, AUTH_FAILED).await
    }

    pub async fn login_google(&self, credential: &str) -> Result<User, Error> {
        let profile = GoogleProfile::from_credential(credential)?;
        self.authenticate("google", &profile, GOOGLE_FAILED).await
    }

    pub async fn login_apple(&self, id_token: &str, name: Option<&str>) -> Result<User, Error> {
        let body = AppleLogin { id_token, name };
        self.authenticate("apple", &body, "Apple authentication failed")
            .await
    }

    async fn authenticate<T>(&self, endpoint: &str, body: &T, fallback: &str) -> Result<User, Error>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(&format!("/auth/{endpoint}"))?;
        let res = self.http.post(url).json(body).send().await?;
        Ok(check(res, fallback).await?.json().await?)
    }

    pub async fn resend_confirmation(&self, email: &str) -> Result<(), Error> {
        let url = self.url("/auth/resend-confirmation")?;
        let res = self
            .http
            .post(url)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        check(res, "Failed to resend confirmation").await?;
        Ok(())
    }

    pub async fn update_profile(&self, user: &User, update: &ProfileUpdate) -> Result<User, Error> {
        let token = user.bearer()?;
        let url = self.url("/auth/profile/update")?;
        let res = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&ProfileRequest {
                user_id: user.id,
                update,
            })
            .send()
            .await?;
        let mut updated: User = check(res, "Failed to update profile").await?.json().await?;
        if updated.token.is_none() {
            updated.token = user.token.clone();
        }
        Ok(updated)
    }

    pub async fn delete_account(&self, user: &User) -> Result<(), Error> {
        let token = user.bearer()?;
        let url = self.url("/auth/delete-account")?;
        let res = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&AccountRequest { user_id: user.id })
            .send()
            .await?;
        check(res, "Failed to delete account").await?;
        info!("Deleted account {}", user.email);
        Ok(())
    }
}
