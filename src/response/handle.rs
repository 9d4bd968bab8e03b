//! # Response Handle
//!
//! The request-scoped wrapper handed to instance-ready listeners. It owns the request's
//! document and the host's responder, and drives a [`RequestWaitCounter`] so that any
//! number of listeners can hold the response back with [`ResponseHandle::wait`] and release
//! it with [`ResponseHandle::done`].
//!
//! A listener that calls `wait()` must eventually call `done()`; otherwise the request is
//! never answered. No timeout is applied here.

use crate::clients::{html_response, HttpResponder, ScriptEngine};
use crate::model::Document;
use crate::response::RequestWaitCounter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

struct Inner {
    document: Mutex<Document>,
    // Thread currently inside `with_document`, holding the document lock.
    editor: Mutex<Option<ThreadId>>,
    emit_deferred: AtomicBool,
    counter: Mutex<RequestWaitCounter>,
    responder: Mutex<Option<Box<dyn HttpResponder>>>,
    engine: Arc<dyn ScriptEngine>,
}

/// Cheap to clone; every clone refers to the same request.
#[derive(Clone)]
pub struct ResponseHandle {
    inner: Arc<Inner>,
}

impl ResponseHandle {
    pub(crate) fn new(document: Document, responder: Box<dyn HttpResponder>, engine: Arc<dyn ScriptEngine>) -> Self {
        Self {
            inner: Arc::new(Inner {
                document: Mutex::new(document),
                editor: Mutex::new(None),
                emit_deferred: AtomicBool::new(false),
                counter: Mutex::new(RequestWaitCounter::new()),
                responder: Mutex::new(Some(responder)),
                engine,
            }),
        }
    }

    /// Holds the response until a matching [`done`](Self::done).
    pub fn wait(&self) {
        lock(&self.inner.counter).wait();
    }

    /// Releases one [`wait`](Self::wait); the last release sends the response.
    pub fn done(&self) {
        let emit = lock(&self.inner.counter).done();
        if emit {
            self.emit();
        }
    }

    /// Sends the document now, whether or not work is still pending. Later sends of any
    /// kind are ignored.
    pub fn send(&self) {
        let emit = lock(&self.inner.counter).claim_send();
        if emit {
            self.emit();
        }
    }

    /// Sends if no work is pending. Run by the template after listeners have been notified.
    pub(crate) fn settle(&self) {
        let emit = lock(&self.inner.counter).settle();
        if emit {
            self.emit();
        }
    }

    pub fn pending(&self) -> usize {
        lock(&self.inner.counter).count()
    }

    pub fn is_sent(&self) -> bool {
        lock(&self.inner.counter).is_sent()
    }

    /// Gives `f` exclusive access to the request's document.
    ///
    /// `f` may call [`done`](Self::done) or [`send`](Self::send); a send they trigger goes
    /// out once `f` returns. `f` must not call `with_document` or [`location`](Self::location).
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let result = {
            let mut document = lock(&self.inner.document);
            *lock(&self.inner.editor) = Some(thread::current().id());
            let result = f(&mut *document);
            *lock(&self.inner.editor) = None;
            result
        };
        if self.inner.emit_deferred.swap(false, Ordering::AcqRel) {
            self.emit();
        }
        result
    }

    /// The URL the document was rendered for.
    pub fn location(&self) -> Option<String> {
        lock(&self.inner.document).location().map(str::to_string)
    }

    /// Runs `script` against the document on the next scheduler turn.
    ///
    /// The response waits for it. A failing script is logged and still releases its wait.
    pub fn run_script(&self, script: impl Into<String>) {
        let script = script.into();
        let handle = self.clone();
        self.wait();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let result = handle.with_document(|document| handle.inner.engine.execute(document, &script));
            if let Err(e) = result {
                warn!(error = %e, "run_script failed");
            }
            handle.done();
        });
    }

    fn emit(&self) {
        if *lock(&self.inner.editor) == Some(thread::current().id()) {
            self.inner.emit_deferred.store(true, Ordering::Release);
            return;
        }
        let body = lock(&self.inner.document).serialize();
        let Some(responder) = lock(&self.inner.responder).take() else {
            return;
        };
        debug!(bytes = body.len(), "Sending document");
        responder.send(html_response(body));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
