//! The host framework's response sink.

use http::header::{HeaderValue, CONTENT_TYPE};
use tokio::sync::oneshot;
use tracing::debug;

/// Accepts the one response produced for a request.
///
/// Taking `Box<Self>` by value makes a second send impossible at the type level.
pub trait HttpResponder: Send + 'static {
    fn send(self: Box<Self>, response: http::Response<String>);
}

impl HttpResponder for oneshot::Sender<http::Response<String>> {
    fn send(self: Box<Self>, response: http::Response<String>) {
        if (*self).send(response).is_err() {
            debug!("Response receiver dropped before send");
        }
    }
}

pub(crate) fn html_response(body: String) -> http::Response<String> {
    with_content_type(body, "text/html; charset=utf-8")
}

pub(crate) fn script_response(body: String) -> http::Response<String> {
    with_content_type(body, "application/javascript")
}

fn with_content_type(body: String, content_type: &'static str) -> http::Response<String> {
    let mut response = http::Response::new(body);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
