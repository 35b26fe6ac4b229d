//! Sync attempts against a calendar's URL.
//!
//! `push` uploads a locally edited calendar, `pull` materializes a remote
//! one. Both share one [`HttpClient`].

mod address;
mod pull;
mod push;

pub use address::{Address, Credentials};
pub(crate) use pull::pull;
pub(crate) use push::push;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::config::Settings;
use crate::error::CalSyncResult;

const CALENDAR_CONTENT_TYPE: &str = "text/calendar";
const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/calendar", "text/plain"];
const LENIENT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP client shared by every calendar.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    accept_octet_stream: bool,
}

impl HttpClient {
    pub fn new(settings: &Settings) -> CalSyncResult<Self> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(&settings.user_agent)
            .build()?;

        Ok(HttpClient {
            client,
            accept_octet_stream: settings.accept_octet_stream,
        })
    }

    /// Build a request, with basic auth if the address embeds credentials.
    fn request(&self, method: Method, address: &Address) -> RequestBuilder {
        let req = self.client.request(method, &address.url);

        match &address.credentials {
            Some(creds) => req.basic_auth(&creds.username, Some(&creds.password)),
            None => req,
        }
    }

    /// Whether a `Content-Type` header value looks like a calendar.
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        content_type.is_some_and(|ct| content_type_accepted(ct, self.accept_octet_stream))
    }
}

/// Check each `;`-separated token of a `Content-Type` value against the
/// accepted set.
pub fn content_type_accepted(content_type: &str, accept_octet_stream: bool) -> bool {
    content_type.split(';').map(str::trim).any(|token| {
        ACCEPTED_CONTENT_TYPES
            .iter()
            .any(|accepted| token.eq_ignore_ascii_case(accepted))
            || (accept_octet_stream && token.eq_ignore_ascii_case(LENIENT_CONTENT_TYPE))
    })
}

/// A completed HTTP response, kept for the calendar's trace log.
#[derive(Debug)]
pub(crate) struct Exchange {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Exchange {
    async fn read(response: Response) -> CalSyncResult<Self> {
        let url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Exchange {
            url,
            status,
            headers,
            body,
        })
    }

    fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// URL, status line and headers, a blank line, then the body.
    fn trace(&self) -> Vec<u8> {
        let mut out = format!("{}\n{}\n", self.url, self.status);
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\n", name, String::from_utf8_lossy(value.as_bytes())));
        }
        out.push('\n');

        let mut out = out.into_bytes();
        out.extend_from_slice(&self.body);
        out.push(b'\n');
        out
    }
}
