use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use http::request::Request;
use http::{Method, StatusCode, Version};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use url::Url;

use crate::error::{Error, Result};

/// Issues a single HTTP call. Errors cover transport problems only; any
/// status code is a valid response.
pub trait Transport {
    fn request(&self, method: &Method, url: &Url, options: &RequestOptions) -> Result<Response>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

/// Per-request settings forwarded verbatim to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
    pub timeout: Option<Duration>,
    pub version: Option<Version>,
}

impl RequestOptions {
    /// Url with the query pairs appended after any already present.
    pub fn target(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Blocking HTTP/1 client on top of hyper.
///
/// Each request opens its own connection and is driven to completion on a
/// private current-thread runtime, so callers never see a future.
pub struct HyperTransport {
    runtime: Runtime,
}

impl HyperTransport {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    async fn fetch(method: &Method, url: &Url, options: &RequestOptions) -> Result<Response> {
        if url.scheme() != "http" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| Error::MissingHost(url.to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{}:{}", host, port);

        let stream = TcpStream::connect(addr).await?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::task::spawn(async move {
            if let Err(err) = conn.await {
                log::warn!("Connection failed: {:?}", err);
            }
        });

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let uri: hyper::Uri = url[url::Position::BeforePath..].parse()?;

        let mut builder = Request::builder()
            .version(options.version.unwrap_or(Version::HTTP_11))
            .method(method.clone())
            .uri(uri);
        if !options.has_header(HOST.as_str()) {
            builder = builder.header(HOST, authority.as_str());
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(http::Error::from)?;
            let value = HeaderValue::from_str(value).map_err(http::Error::from)?;
            builder = builder.header(name, value);
        }

        let body = match &options.body {
            None => Bytes::new(),
            Some(Body::Text(text)) => Bytes::from(text.clone()),
            Some(Body::Json(value)) => {
                if !options.has_header(CONTENT_TYPE.as_str()) {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                Bytes::from(serde_json::to_vec(value)?)
            }
        };

        let req = builder.body(Full::new(body))?;

        let res = sender.send_request(req).await?;
        let status = res.status();
        let headers = res.headers().clone();

        let body = res.collect().await?.to_bytes();

        Ok(Response::new(status, headers, body))
    }
}

impl Transport for HyperTransport {
    fn request(&self, method: &Method, url: &Url, options: &RequestOptions) -> Result<Response> {
        let url = options.target(url);
        log::debug!("{} {}", method, url);

        let fetch = Self::fetch(method, &url, options);
        self.runtime.block_on(async {
            match options.timeout {
                Some(limit) => match tokio::time::timeout(limit, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(limit)),
                },
                None => fetch.await,
            }
        })
    }
}
