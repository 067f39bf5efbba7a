// The access gate: nothing is fetched before the administrator signs in.

use serde::Deserialize;
use serde_json::json;
use snafu::{prelude::*, Snafu};
use std::io::BufRead;

use crate::dashboard::config_reader::{AdminSettings, FirebaseSettings};
use crate::dashboard::{
    AuthenticationSnafu, DashResult, DashboardError, HttpRequestSnafu, MissingFirebaseSettingsSnafu,
    ReadingPasswordSnafu,
};
use log::{debug, info, warn};

pub const DEFAULT_PASSWORD_ENV: &str = "ASM_ADMIN_PASSWORD";

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum AuthError {
    #[snafu(display("Incorrect password"))]
    InvalidPassword {},
    #[snafu(display("No user found with this email"))]
    UserNotFound {},
    #[snafu(display("Too many failed attempts. Please try again later"))]
    TooManyAttempts {},
    #[snafu(display("Failed to sign in: {message}"))]
    AuthFailed { message: String },
}

/// Proof of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    email: String,
    id_token: Option<String>,
}

impl AccessGrant {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The token to present to the hosted database, if the sign-in produced one.
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(email: &str) -> AccessGrant {
        AccessGrant {
            email: email.to_string(),
            id_token: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests_with_token(email: &str, token: &str) -> AccessGrant {
        AccessGrant {
            email: email.to_string(),
            id_token: Some(token.to_string()),
        }
    }
}

/// Reads the password from the given environment variable, or else one line of stdin.
pub fn read_password(env_var: &str) -> DashResult<String> {
    if let Ok(p) = std::env::var(env_var) {
        debug!("read_password: using {}", env_var);
        return Ok(p);
    }
    eprintln!("Password for the administrator account:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context(ReadingPasswordSnafu {})?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

pub fn sign_in(
    admin: &AdminSettings,
    firebase: Option<&FirebaseSettings>,
    email: &str,
    password: &str,
) -> DashResult<AccessGrant> {
    info!("sign_in: provider {:?} for {}", admin.provider, email);
    match admin.provider.as_str() {
        "local" => sign_in_local(admin, email, password).context(AuthenticationSnafu {}),
        "firebase" => {
            let settings = firebase.context(MissingFirebaseSettingsSnafu {})?;
            sign_in_firebase(settings, email, password)
        }
        x => Err(DashboardError::UnknownProvider {
            provider: x.to_string(),
        }),
    }
}

fn sign_in_local(admin: &AdminSettings, email: &str, password: &str) -> Result<AccessGrant, AuthError> {
    ensure!(
        email.trim().eq_ignore_ascii_case(admin.email.trim()),
        UserNotFoundSnafu {}
    );
    let expected = admin
        .password_sha256
        .as_deref()
        .context(AuthFailedSnafu {
            message: "no password digest configured for the local provider",
        })?;
    let digest = sha256::digest(password.to_string());
    ensure!(
        digest.eq_ignore_ascii_case(expected.trim()),
        InvalidPasswordSnafu {}
    );
    Ok(AccessGrant {
        email: admin.email.clone(),
        id_token: None,
    })
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(rename = "idToken")]
    id_token: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorResponse {
    error: IdentityErrorBody,
}

fn sign_in_firebase(
    settings: &FirebaseSettings,
    email: &str,
    password: &str,
) -> DashResult<AccessGrant> {
    let api_key = settings.api_key()?;
    let url = format!("{}/v1/accounts:signInWithPassword", settings.auth_endpoint());
    let body = json!({
        "email": email,
        "password": password,
        "returnSecureToken": true,
    });
    let resp = reqwest::blocking::Client::new()
        .post(url.as_str())
        .query(&[("key", api_key.as_str())])
        .json(&body)
        .send()
        .context(HttpRequestSnafu { url: url.clone() })?;

    if resp.status().is_success() {
        let r: SignInResponse = resp.json().context(HttpRequestSnafu { url })?;
        return Ok(AccessGrant {
            email: r.email.unwrap_or_else(|| email.to_string()),
            id_token: Some(r.id_token),
        });
    }

    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    warn!("sign_in_firebase: status {}: {}", status, text);
    let code = serde_json::from_str::<IdentityErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    Err(map_identity_error(&code)).context(AuthenticationSnafu {})
}

/// The identity service appends details to some codes (`TOO_MANY_ATTEMPTS_TRY_LATER : ...`).
fn map_identity_error(code: &str) -> AuthError {
    let c = code.trim();
    if c.starts_with("INVALID_PASSWORD") || c.starts_with("INVALID_LOGIN_CREDENTIALS") {
        AuthError::InvalidPassword {}
    } else if c.starts_with("EMAIL_NOT_FOUND") {
        AuthError::UserNotFound {}
    } else if c.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
        AuthError::TooManyAttempts {}
    } else {
        AuthError::AuthFailed {
            message: c.to_string(),
        }
    }
}
