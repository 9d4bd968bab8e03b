use std::sync::Arc;
use std::time::Duration;
use templatr::clients::{ExecutionError, FsReader, ScriptLoaders};
use templatr::config::{TemplateConfig, TemplateOptions};
use templatr::error::TemplateError;
use templatr::framework::mock::MockFetcher;
use templatr::lifecycle::{Template, TemplateBuilder};
use templatr::model::Document;
use templatr::response::ResponseHandle;
use tokio::sync::oneshot;

const PAGE: &str = "<html><head><script>setup();</script></head><body></body></html>";

fn site(markup: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("template.htm"), markup).unwrap();
    dir
}

fn builder(dir: &tempfile::TempDir) -> TemplateBuilder {
    Template::builder(TemplateConfig::new(dir.path()).with_options(TemplateOptions::MERGE_SCRIPTS))
}

/// Appends `text` to the document body.
fn append_to_body(document: &mut Document, text: &str) {
    let body = document.elements_by_tag_name("body")[0];
    document.append_text(body, text);
}

fn request(path: &str) -> http::Request<()> {
    http::Request::get(path).body(()).unwrap()
}

#[tokio::test]
async fn test_request_before_ready_goes_to_next() {
    let dir = site("<script src=\"https://cdn.example.com/slow.js\"></script>");
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch("https://cdn.example.com/slow.js")
        .after(Duration::from_secs(30))
        .return_ok("slow();");
    let template = builder(&dir)
        .loaders(ScriptLoaders::new(Arc::new(FsReader), Arc::new(fetcher)))
        .build()
        .unwrap();

    let (tx, mut rx) = oneshot::channel::<http::Response<String>>();
    let mut forwarded = None;
    let result = template
        .middleware()
        .handle(&request("/"), tx, |responder| forwarded = Some(responder));

    assert!(result.is_ok());
    assert!(!template.is_ready());
    assert!(forwarded.is_some());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_execution_failure_drops_responder() {
    let dir = site(PAGE);
    let template = builder(&dir)
        .engine(|_: &mut Document, script: &str| -> Result<(), ExecutionError> {
            Err(ExecutionError::from(format!("cannot run {script}")))
        })
        .build()
        .unwrap();
    let prepared = template.ready().await.unwrap();
    let markup_before = prepared.markup();

    let (tx, rx) = oneshot::channel();
    let result = template
        .middleware()
        .handle(&request("/"), tx, |_| panic!("template should be ready"));

    assert!(matches!(result, Err(TemplateError::Execution(_))));
    assert!(rx.await.is_err());
    assert_eq!(prepared.markup(), markup_before);
}

#[tokio::test]
async fn test_listeners_hold_response_until_last_done() {
    let dir = site(PAGE);
    let template = builder(&dir)
        .on_instance_ready(|response: ResponseHandle| {
            for (delay, text) in [(30, "slow"), (10, "fast")] {
                let response = response.clone();
                response.wait();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    response.with_document(|document| append_to_body(document, text));
                    response.done();
                });
            }
            assert_eq!(response.pending(), 2);
        })
        .build()
        .unwrap();
    template.ready().await.unwrap();

    let (tx, rx) = oneshot::channel();
    template
        .middleware()
        .handle(&request("/"), tx, |_| panic!("template should be ready"))
        .unwrap();

    let response = rx.await.unwrap();
    assert!(response.body().contains("<body>fastslow</body>"));
}

#[tokio::test]
async fn test_explicit_send_wins_over_later_done() {
    let dir = site(PAGE);
    let template = builder(&dir)
        .on_instance_ready(|response: ResponseHandle| {
            response.wait();
            response.with_document(|document| append_to_body(document, "early"));
            response.send();
            assert!(response.is_sent());

            response.with_document(|document| append_to_body(document, "late"));
            response.done();
            response.send();
        })
        .build()
        .unwrap();
    template.ready().await.unwrap();

    let (tx, rx) = oneshot::channel();
    template
        .middleware()
        .handle(&request("/"), tx, |_| panic!("template should be ready"))
        .unwrap();

    let response = rx.await.unwrap();
    assert!(response.body().contains("<body>early</body>"));
}

#[tokio::test]
async fn test_run_script_delays_response() {
    let dir = site(PAGE);
    let template = builder(&dir)
        .engine(|document: &mut Document, script: &str| -> Result<(), ExecutionError> {
            if script == "mark();" {
                append_to_body(document, "marked");
            }
            Ok(())
        })
        .on_instance_ready(|response: ResponseHandle| response.run_script("mark();"))
        .build()
        .unwrap();
    template.ready().await.unwrap();

    let (tx, rx) = oneshot::channel();
    template
        .middleware()
        .handle(&request("/"), tx, |_| panic!("template should be ready"))
        .unwrap();

    let response = rx.await.unwrap();
    assert!(response.body().contains("<body>marked</body>"));
}

#[tokio::test]
async fn test_concurrent_requests_render_independent_documents() {
    let dir = site(PAGE);
    let template = builder(&dir)
        .on_instance_ready(|response: ResponseHandle| {
            response.wait();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let location = response.location().unwrap_or_default();
                response.with_document(|document| append_to_body(document, &location));
                response.done();
            });
        })
        .build()
        .unwrap();
    template.ready().await.unwrap();

    let middleware = template.middleware();
    let (tx_a, rx_a) = oneshot::channel();
    let (tx_b, rx_b) = oneshot::channel();
    middleware
        .handle(&request("/a"), tx_a, |_| panic!("template should be ready"))
        .unwrap();
    middleware
        .handle(&request("/b?page=2"), tx_b, |_| panic!("template should be ready"))
        .unwrap();

    let (a, b) = (rx_a.await.unwrap(), rx_b.await.unwrap());
    assert!(a.body().contains("<body>http://localhost/a</body>"));
    assert!(b.body().contains("<body>http://localhost/b?page=2</body>"));
    assert!(template.prepared().unwrap().markup().contains("<body></body>"));
}

#[tokio::test]
async fn test_html_response_has_html_content_type() {
    let dir = site(PAGE);
    let template = builder(&dir).build().unwrap();
    template.ready().await.unwrap();

    let (tx, rx) = oneshot::channel();
    template
        .middleware()
        .handle(&request("/"), tx, |_| panic!("template should be ready"))
        .unwrap();

    let response = rx.await.unwrap();
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    assert!(response.body().contains("<script src=\"./script-0.js\"></script>"));
}
