use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode, Version};
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::message::{Message, Outcome};
use crate::transport::{Body, RequestOptions, Response, Transport};

/// A single HTTP request checked against an expected status code.
#[derive(Clone)]
pub struct TestRequest {
    name: String,
    method: Method,
    url: Url,
    expected_status: StatusCode,
    options: RequestOptions,
    transport: Arc<dyn Transport>,
    response: Option<Response>,
}

impl TestRequest {
    pub fn new(
        name: impl Into<String>,
        method: Method,
        url: Url,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            url,
            expected_status: StatusCode::OK,
            options: RequestOptions::default(),
            transport,
            response: None,
        }
    }

    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.options.body = Some(Body::Json(value));
        self
    }

    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.options.body = Some(Body::Text(text.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.options.version = Some(version);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn expected_status(&self) -> StatusCode {
        self.expected_status
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }
}

impl<C> Message<C> for TestRequest {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, _context: &mut C) -> Result<()> {
        self.response = None;
        let response = self
            .transport
            .request(&self.method, &self.url, &self.options)?;

        if response.status() == self.expected_status {
            log::info!("{}: {}", self.name, response.status());
        } else {
            log::info!(
                "{}: http status does not match, expected {}, but got {}",
                self.name,
                self.expected_status,
                response.status()
            );
        }

        self.response = Some(response);
        Ok(())
    }

    fn success(&self) -> Outcome {
        match &self.response {
            None => Outcome::NotRun,
            Some(response) => Outcome::from(response.status() == self.expected_status),
        }
    }

    fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}
