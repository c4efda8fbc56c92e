use serde_json::json;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, ApiRequest, Transport};
use crate::types::{TokenResponse, User};

use super::{SessionHandle, SessionState, TokenClaims};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";

/// Drives the session through login, registration, logout and startup
/// validation. All state lands in the client's [`SessionHandle`].
pub struct AuthManager<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> AuthManager<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn session(&self) -> &SessionHandle {
        self.client.session()
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    /// Exchanges credentials for a token, then loads the profile. Any failure
    /// leaves the session anonymous.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .anonymous()
            .form(&[("username", email), ("password", password)]);

        let token: TokenResponse = match self.client.execute(request).await {
            Ok(response) => response.json()?,
            Err(err) => {
                self.session().clear();
                return Err(err);
            }
        };

        self.session().set_token(token.access_token);
        match self.current_user().await {
            Ok(user) => {
                self.session().set_user(user.clone());
                info!(user = %user.email, "logged in");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "profile fetch after login failed");
                self.session().clear();
                Err(err)
            }
        }
    }

    /// Creates the account and, when `auto_login` is set, signs in with the
    /// same credentials.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        auto_login: bool,
    ) -> Result<User, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).anonymous().json(json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        let created: User = self.client.execute(request).await?.json()?;
        info!(user = %created.email, "account registered");

        if auto_login {
            return self.login(email, password).await;
        }
        Ok(created)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client
            .execute(ApiRequest::get(ME_PATH))
            .await?
            .json()
    }

    pub fn logout(&self) {
        self.session().clear();
        info!("logged out");
    }

    /// Validates a stored token at startup. An expired or rejected token is
    /// dropped and the session stays anonymous.
    pub async fn bootstrap(&self, now_unix: i64) -> SessionState {
        let Some(token) = self.session().token() else {
            return SessionState::Anonymous;
        };

        if TokenClaims::decode(&token).is_some_and(|claims| claims.is_expired_at(now_unix)) {
            info!("stored token has expired");
            self.session().clear();
            return SessionState::Anonymous;
        }

        match self.current_user().await {
            Ok(user) => {
                self.session().set_user(user);
                self.session().state()
            }
            Err(err) => {
                warn!(error = %err, "stored session rejected");
                self.session().clear();
                SessionState::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::{ApiResponse, RequestBody};
    use crate::auth::Session;

    const ME_BODY: &str = r#"{"id": "u-1", "name": "Ada", "email": "ada@example.com"}"#;

    fn client(responses: Vec<ApiResponse>) -> ApiClient<ScriptedTransport> {
        ApiClient::with_default_chain(
            ScriptedTransport::new(responses),
            SessionHandle::in_memory(),
        )
    }

    fn token_expiring_at(exp: i64) -> String {
        format!(
            "header.{}.sig",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"ada@example.com","exp":{exp}}}"#))
        )
    }

    #[tokio::test]
    async fn login_stores_token_and_user() {
        let client = client(vec![
            ApiResponse::new(200, r#"{"access_token": "tok-1", "token_type": "bearer"}"#),
            ApiResponse::new(200, ME_BODY),
        ]);
        let auth = AuthManager::new(&client);

        let user = auth
            .login("ada@example.com", "secret")
            .await
            .expect("login should succeed");

        assert_eq!(user.name, "Ada");
        assert_eq!(auth.state(), SessionState::Authenticated(user));
        assert_eq!(client.session().token().as_deref(), Some("tok-1"));

        let login = client.transport().seen()[0].clone();
        assert!(!login.authenticated);
        assert_eq!(
            login.body,
            Some(RequestBody::Form(vec![
                ("username".to_string(), "ada@example.com".to_string()),
                ("password".to_string(), "secret".to_string()),
            ]))
        );
    }

    #[tokio::test]
    async fn rejected_login_stores_nothing() {
        let client = client(vec![ApiResponse::new(
            401,
            r#"{"detail": "Incorrect email or password"}"#,
        )]);
        let auth = AuthManager::new(&client);

        let err = auth
            .login("ada@example.com", "wrong")
            .await
            .expect_err("login should fail");

        assert_eq!(err.user_message(), "Incorrect email or password");
        assert_eq!(client.session().snapshot(), Session::default());
        assert_eq!(client.transport().paths(), vec!["POST /auth/login"]);
    }

    #[tokio::test]
    async fn failed_profile_fetch_rolls_back_login() {
        let client = client(vec![
            ApiResponse::new(200, r#"{"access_token": "tok-1"}"#),
            ApiResponse::new(500, ""),
        ]);
        let auth = AuthManager::new(&client);

        auth.login("ada@example.com", "secret")
            .await
            .expect_err("login should fail");

        assert!(client.session().token().is_none());
    }

    #[tokio::test]
    async fn register_logs_in_when_requested() {
        let client = client(vec![
            ApiResponse::new(201, ME_BODY),
            ApiResponse::new(200, r#"{"access_token": "tok-1"}"#),
            ApiResponse::new(200, ME_BODY),
        ]);
        let auth = AuthManager::new(&client);

        auth.register("Ada", "ada@example.com", "secret", true)
            .await
            .expect("register should succeed");

        assert!(auth.session().snapshot().is_authenticated());
        assert_eq!(
            client.transport().paths(),
            vec!["POST /auth/register", "POST /auth/login", "GET /auth/me"]
        );
    }

    #[tokio::test]
    async fn register_without_login_stays_anonymous() {
        let client = client(vec![ApiResponse::new(201, ME_BODY)]);
        let auth = AuthManager::new(&client);

        let user = auth
            .register("Ada", "ada@example.com", "secret", false)
            .await
            .expect("register should succeed");

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(auth.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn bootstrap_drops_expired_token_without_network() {
        let client = client(Vec::new());
        client.session().set_token(token_expiring_at(1_000));
        let auth = AuthManager::new(&client);

        assert_eq!(auth.bootstrap(2_000).await, SessionState::Anonymous);
        assert!(client.session().token().is_none());
        assert!(client.transport().paths().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_confirms_valid_token() {
        let client = client(vec![ApiResponse::new(200, ME_BODY)]);
        client.session().set_token(token_expiring_at(5_000));
        let auth = AuthManager::new(&client);

        let state = auth.bootstrap(2_000).await;
        assert!(matches!(state, SessionState::Authenticated(user) if user.id == "u-1"));
    }

    #[tokio::test]
    async fn bootstrap_clears_rejected_token() {
        let client = client(vec![
            ApiResponse::new(401, ""),
            ApiResponse::new(401, ""),
        ]);
        client.session().set_token("opaque".to_string());
        let auth = AuthManager::new(&client);

        assert_eq!(auth.bootstrap(0).await, SessionState::Anonymous);
        assert!(client.session().token().is_none());
    }
}
