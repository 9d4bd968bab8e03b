//! # Middleware
//!
//! The `(request, response, next)` entry point host frameworks plug in.
//!
//! For each request the middleware either:
//! - serves a bundle verbatim when the path ends in `script-<index>.js` and that bundle has
//!   content (no document is rendered), or
//! - renders the template for the request and answers through the responder once every
//!   listener is done.
//!
//! Requests that arrive while the template is still loading are not handled: the responder
//! goes to `next` untouched.

use crate::bundler::bundle_index;
use crate::clients::{script_response, HttpResponder};
use crate::error::TemplateError;
use crate::lifecycle::Template;
use tracing::{debug, instrument, warn};

/// Request handler bound to one template. Cheap to clone.
#[derive(Clone)]
pub struct Middleware {
    template: Template,
}

impl Middleware {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Handles one request.
    ///
    /// Once the request is handled, `next` is never called. An `Err` means rendering failed;
    /// the responder has been dropped unsent and the host should answer through its own
    /// error path.
    #[instrument(skip_all, fields(path = %request.uri().path()))]
    pub fn handle<B, R, N>(&self, request: &http::Request<B>, responder: R, next: N) -> Result<(), TemplateError>
    where
        R: HttpResponder,
        N: FnOnce(R),
    {
        let Some(prepared) = self.template.prepared() else {
            debug!("Template still loading, passing request on");
            next(responder);
            return Ok(());
        };

        if let Some(index) = bundle_index(request.uri().path()) {
            if let Some(bundle) = prepared.bundles().servable(index) {
                debug!(index, "Serving bundle");
                HttpResponder::send(Box::new(responder), script_response(bundle.content().to_string()));
                return Ok(());
            }
            debug!(index, "No servable bundle, rendering document");
        }

        self.template
            .render(&prepared, request.uri(), Box::new(responder))
            .map(|_| ())
            .inspect_err(|e| warn!(error = %e, "Request rendering failed"))
    }
}
