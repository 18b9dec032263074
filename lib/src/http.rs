use curl::easy::{Easy, List};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RequestError;
use crate::policy::RequestPolicy;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(url: &str) -> Request {
        Request {
            method: Method::Get,
            url: url.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json<T: Serialize>(url: &str, payload: &T) -> Result<Request, RequestError> {
        let body = serde_json::to_vec(payload)?;
        Ok(Request {
            method: Method::Post,
            url: url.to_string(),
            query: Vec::new(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
}

impl Response {
    pub fn new(status: u32, body: Vec<u8>) -> Response {
        Response { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with [`RequestError::Status`] for anything outside of 2xx
    pub fn error_for_status(self) -> Result<Response, RequestError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RequestError::Status(self.status))
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the `result` member of the service's JSON envelope
    pub fn result<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        let envelope: Envelope<T> = serde_json::from_slice(&self.body)?;
        envelope.result.ok_or(RequestError::EmptyResult)
    }
}

/// Sends a single request and hands back whatever the server answered.
///
/// Implementations must not retry.
#[cfg_attr(test, automock)]
pub trait HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, RequestError>;
}

/// Blocking libcurl transport
pub struct CurlTransport {
    policy: RequestPolicy,
}

impl CurlTransport {
    pub fn new(policy: RequestPolicy) -> CurlTransport {
        CurlTransport { policy }
    }
}

pub(crate) fn build_url(easy: &mut Easy, request: &Request) -> String {
    if request.query.is_empty() {
        return request.url.clone();
    }
    let query = request.query.iter()
        .map(|(k, v)| format!("{}={}", easy.url_encode(k.as_bytes()), easy.url_encode(v.as_bytes())))
        .collect::<Vec<String>>()
        .join("&");
    let separator = if request.url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", request.url, separator, query)
}

impl HttpTransport for CurlTransport {
    fn send(&self, request: &Request) -> Result<Response, RequestError> {
        let mut easy = Easy::new();
        let url = build_url(&mut easy, request);
        debug!("{:?} {}", request.method, url);

        easy.url(&url)?;
        easy.timeout(self.policy.deadline())?;
        easy.follow_location(true)?;

        let mut headers = List::new();
        for (key, value) in &request.headers {
            headers.append(&format!("{}: {}", key, value))?;
        }
        easy.http_headers(headers)?;

        match request.method {
            Method::Get => easy.get(true)?,
            Method::Post => {
                easy.post(true)?;
                easy.post_fields_copy(request.body.as_deref().unwrap_or_default())?;
            }
        }

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        debug!("{} answered with {} ({} bytes)", url, status, body.len());
        Ok(Response { status, body })
    }
}
