use tracing::{debug, info, warn};

use crate::auth::SessionHandle;
use crate::types::TokenResponse;

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::ApiError;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Request/response middleware. Interceptors run in registration order on the
/// way out and again, in the same order, on the way back.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_request(&self, request: &mut ApiRequest, session: &SessionHandle);

    fn on_response(&self, _request: &ApiRequest, _response: &ApiResponse) {}
}

/// Attaches `Authorization: Bearer <token>` to authenticated requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerAuth;

impl Interceptor for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn on_request(&self, request: &mut ApiRequest, session: &SessionHandle) {
        if !request.authenticated {
            return;
        }
        if let Some(token) = session.token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLog;

impl Interceptor for RequestLog {
    fn name(&self) -> &'static str {
        "request-log"
    }

    fn on_request(&self, request: &mut ApiRequest, _session: &SessionHandle) {
        debug!(method = %request.method, path = %request.path, "api request");
    }

    fn on_response(&self, request: &ApiRequest, response: &ApiResponse) {
        if response.is_success() {
            debug!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "api response"
            );
        } else {
            warn!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "api request failed"
            );
        }
    }
}

pub struct ApiClient<T> {
    transport: T,
    session: SessionHandle,
    interceptors: Vec<Box<dyn Interceptor>>,
}

pub struct ApiClientBuilder<T> {
    transport: T,
    session: SessionHandle,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl<T> ApiClientBuilder<T> {
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn build(self) -> ApiClient<T> {
        ApiClient {
            transport: self.transport,
            session: self.session,
            interceptors: self.interceptors,
        }
    }
}

impl<T> ApiClient<T> {
    pub fn builder(transport: T, session: SessionHandle) -> ApiClientBuilder<T> {
        ApiClientBuilder {
            transport,
            session,
            interceptors: Vec::new(),
        }
    }

    /// Bearer auth followed by request logging.
    pub fn with_default_chain(transport: T, session: SessionHandle) -> Self {
        Self::builder(transport, session)
            .interceptor(BearerAuth)
            .interceptor(RequestLog)
            .build()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.interceptors
            .iter()
            .map(|interceptor| interceptor.name())
            .collect()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Sends a request and applies the 401 policy: an authenticated request
    /// rejected with 401 triggers one token refresh and one retry. If the
    /// refresh fails or the retry is rejected again, the session is cleared.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.dispatch(&request).await?;
        if response.status != 401 || !request.authenticated {
            return response.into_result();
        }

        info!(path = %request.path, "request rejected with 401, refreshing token");
        if let Err(err) = self.refresh_token().await {
            warn!(error = %err, "token refresh failed, ending session");
            self.session.clear();
            return Err(ApiError::from_response(response.status, &response.body));
        }

        let retried = self.dispatch(&request).await?;
        if retried.status == 401 {
            warn!(path = %request.path, "request still unauthorized after refresh, ending session");
            self.session.clear();
        }
        retried.into_result()
    }

    pub async fn refresh_token(&self) -> Result<(), ApiError> {
        if self.session.token().is_none() {
            return Err(ApiError::NotAuthenticated);
        }

        let request = ApiRequest::post(REFRESH_PATH);
        let response = self.dispatch(&request).await?.into_result()?;
        let token: TokenResponse = response.json()?;
        self.session.set_token(token.access_token);
        Ok(())
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut outgoing = request.clone();
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut outgoing, &self.session);
        }

        let response = self.transport.send(&outgoing).await?;

        for interceptor in &self.interceptors {
            interceptor.on_response(&outgoing, &response);
        }
        Ok(response)
    }
}
