use std::{io, sync::Mutex};

use bytes::{Buf, Bytes};
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    Client, Method,
};
use url::Url;

use super::error::TemplateError;

/// Where a template's body comes from.
///
/// `Buffered` bodies can be re-read any number of times. `OneShot` bodies wrap a source that
/// cannot be rewound: the first copy receives the bytes, every later copy fails.
#[derive(Debug)]
pub enum RequestBody {
    Buffered(Bytes),
    OneShot(Mutex<Option<Bytes>>),
}

impl RequestBody {
    pub fn buffered(bytes: impl Into<Bytes>) -> Self {
        RequestBody::Buffered(bytes.into())
    }

    pub fn one_shot(bytes: impl Into<Bytes>) -> Self {
        RequestBody::OneShot(Mutex::new(Some(bytes.into())))
    }

    pub fn is_replayable(&self) -> bool {
        matches!(self, RequestBody::Buffered(_))
    }

    /// Bytes of a replayable body, without consuming anything.
    pub fn peek(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Buffered(bytes) => Some(bytes),
            RequestBody::OneShot(_) => None,
        }
    }

    fn reopen(&self) -> Result<BodyStream, TemplateError> {
        let bytes = match self {
            RequestBody::Buffered(bytes) => bytes.clone(),
            RequestBody::OneShot(slot) => slot
                .lock()
                .map_err(|_| TemplateError::BodyNotReplayable)?
                .take()
                .ok_or(TemplateError::BodyNotReplayable)?,
        };
        Ok(BodyStream { remaining: bytes })
    }
}

/// A fresh read cursor over one copy's body.
#[derive(Debug)]
pub struct BodyStream {
    remaining: Bytes,
}

impl BodyStream {
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn into_body(self) -> reqwest::Body {
        reqwest::Body::from(self.remaining)
    }
}

impl io::Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining.len());
        buf[..n].copy_from_slice(&self.remaining[..n]);
        self.remaining.advance(n);
        Ok(n)
    }
}

/// The immutable description of the request being replicated.
#[derive(Debug)]
pub struct RequestTemplate {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl RequestTemplate {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Produces a copy that shares no mutable state with the template or other copies.
    pub fn replicate(&self) -> Result<RequestCopy, TemplateError> {
        let body = self.body.as_ref().map(RequestBody::reopen).transpose()?;
        Ok(RequestCopy {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
        })
    }
}

#[derive(Debug)]
pub struct RequestCopy {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<BodyStream>,
}

impl RequestCopy {
    pub fn into_request(self, client: &Client) -> reqwest::Result<reqwest::Request> {
        let mut builder = client.request(self.method, self.url).headers(self.headers);
        if let Some(body) = self.body {
            builder = builder.body(body.into_body());
        }
        builder.build()
    }
}
