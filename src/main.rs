//! # Templatr Demo
//!
//! Loads a template, waits for it to be prepared and renders one request to stdout.
//!
//! ```bash
//! RUST_LOG=info cargo run -- <template_dir> [template_name] [request_path]
//! ```

use templatr::config::{TemplateConfig, TemplateOptions};
use templatr::lifecycle::{setup_tracing, Template};
use tokio::sync::oneshot;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let mut args = std::env::args().skip(1);
    let template_dir = args
        .next()
        .ok_or("usage: templatr <template_dir> [template_name] [request_path]")?;
    let mut config = TemplateConfig::new(template_dir).with_options(
        TemplateOptions::MERGE_SCRIPTS | TemplateOptions::REMOVE_WHITE_SPACE | TemplateOptions::VERBOSE,
    );
    if let Some(name) = args.next() {
        config = config.with_template_name(name);
    }
    let path = args.next().unwrap_or_else(|| "/".to_string());

    let template = Template::builder(config)
        .on_prepared(|template| info!(ready = template.is_ready(), "Template prepared"))
        .build()
        .map_err(|e| e.to_string())?;

    let prepared = template
        .ready()
        .instrument(tracing::info_span!("preparation"))
        .await
        .map_err(|e| e.to_string())?;
    info!(bundles = prepared.bundles().len(), scripts = prepared.scripts().len(), "Serving");

    let request = http::Request::get(path.as_str())
        .body(())
        .map_err(|e| e.to_string())?;
    let (tx, rx) = oneshot::channel();

    tracing::info_span!("request", %path)
        .in_scope(|| {
            template
                .middleware()
                .handle(&request, tx, |_| warn!("Template was not ready"))
        })
        .map_err(|e| e.to_string())?;

    let response = rx.await.map_err(|e| e.to_string())?;
    println!("{}", response.body());
    Ok(())
}
