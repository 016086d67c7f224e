use crate::config::Config;
use crate::errors::{SignupApiError, SignupError};
use crate::handler::SignupHandler;
use http::header::{ALLOW, HeaderValue};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{make_boxed_error_response, make_json_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Serves `POST {signup_path}`. Anything else is a 404 or 405.
pub struct SignupService {
    handler: Arc<SignupHandler>,
    path: Arc<str>,
    max_body_bytes: usize,
}

impl SignupService {
    pub fn new(handler: Arc<SignupHandler>, config: &Config) -> Self {
        SignupService {
            handler,
            path: config.signup_path.as_str().into(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Service<Request<Incoming>> for SignupService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = SignupApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();
        let path = self.path.clone();
        let max_body_bytes = self.max_body_bytes;

        Box::pin(async move {
            if req.uri().path() != &*path {
                tracing::debug!(path = %req.uri().path(), "No route matched");
                return Ok(make_boxed_error_response(StatusCode::NOT_FOUND));
            }

            if req.method() != Method::POST {
                let mut response = make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("POST"));
                return Ok(response);
            }

            let response = match read_body(req.into_body(), max_body_bytes).await {
                Ok(body) => handler.handle(&body).await,
                Err(e) => handler.reject(e),
            };

            Ok(make_json_response(response.status, &response.body))
        })
    }
}

async fn read_body(body: Incoming, limit: usize) -> Result<Bytes, SignupError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(SignupError::PayloadTooLarge(limit)),
        Err(e) => Err(SignupError::BodyRead(e.to_string())),
    }
}
