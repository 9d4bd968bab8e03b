//! # Template Lifecycle
//!
//! A [`Template`] moves through two states, once:
//!
//! 1. **Loading** - [`TemplateBuilder::build`] reads and parses the template file, creates
//!    one [`ScriptSource`] per script tag, detaches server-only tags, spawns one loader task
//!    per source, and hands the sources to a [`ScriptLoadBarrier`].
//! 2. **Ready** - when the barrier fires, the [`BundlePlanner`] rewrites the document and
//!    the result is frozen into a [`PreparedTemplate`]. It is published exactly once and is
//!    read-only from then on.
//!
//! Every request then works on its own clone of the prepared document, so requests never
//! write to shared state.

use crate::bundler::{compact_whitespace, BundlePlanner, BundleTable};
use crate::clients::{HttpResponder, NoopEngine, ScriptEngine, ScriptLoaders};
use crate::config::{TemplateConfig, TemplateOptions};
use crate::error::TemplateError;
use crate::framework::{ScriptLoadBarrier, ScriptSource};
use crate::lifecycle::{verbose, Middleware};
use crate::model::Document;
use crate::response::ResponseHandle;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

type PreparedListener = Box<dyn FnOnce(Template) + Send>;
type InstanceListener = Arc<dyn Fn(ResponseHandle) + Send + Sync>;

/// The frozen result of loading: the post-merge document, its bundles and every loaded
/// script in document order.
#[derive(Debug)]
pub struct PreparedTemplate {
    document: Document,
    bundles: BundleTable,
    scripts: Vec<ScriptSource>,
}

impl PreparedTemplate {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The prepared markup, doctype included.
    pub fn markup(&self) -> String {
        self.document.serialize()
    }

    pub fn bundles(&self) -> &BundleTable {
        &self.bundles
    }

    /// All scripts, server-only ones included.
    pub fn scripts(&self) -> &[ScriptSource] {
        &self.scripts
    }
}

/// Wires collaborators and listeners, then starts loading.
pub struct TemplateBuilder {
    config: TemplateConfig,
    loaders: ScriptLoaders,
    engine: Arc<dyn ScriptEngine>,
    on_prepared: Option<PreparedListener>,
    on_instance_ready: Option<InstanceListener>,
}

impl TemplateBuilder {
    pub fn new(config: TemplateConfig) -> Self {
        Self {
            config,
            loaders: ScriptLoaders::default(),
            engine: Arc::new(NoopEngine),
            on_prepared: None,
            on_instance_ready: None,
        }
    }

    pub fn loaders(mut self, loaders: ScriptLoaders) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn engine(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Called once, when the template becomes ready.
    pub fn on_prepared(mut self, listener: impl FnOnce(Template) + Send + 'static) -> Self {
        self.on_prepared = Some(Box::new(listener));
        self
    }

    /// Called for every rendered request, after its scripts ran and before it is sent.
    /// Call [`ResponseHandle::wait`] to hold the response for asynchronous work.
    pub fn on_instance_ready(mut self, listener: impl Fn(ResponseHandle) + Send + Sync + 'static) -> Self {
        self.on_instance_ready = Some(Arc::new(listener));
        self
    }

    /// Reads the template and starts loading its scripts.
    ///
    /// A missing template file is reported here, before anything is spawned. Must be called
    /// from within a Tokio runtime.
    #[instrument(skip(self), fields(template = %self.config.template_path().display()))]
    pub fn build(self) -> Result<Template, TemplateError> {
        let path = self.config.template_path();
        let raw = std::fs::read_to_string(&path).map_err(|source| TemplateError::TemplateNotFound {
            path: path.clone(),
            source,
        })?;

        let options = self.config.options;
        let markup = if options.removes_white_space() {
            compact_whitespace(&raw).into_owned()
        } else {
            raw
        };

        let mut document = Document::parse(&markup);
        let sources: Vec<ScriptSource> = document
            .elements_by_tag_name("script")
            .into_iter()
            .enumerate()
            .map(|(index, node)| ScriptSource::from_element(&document, node, index, &self.config.template_dir))
            .collect();
        for source in sources.iter().filter(|s| s.is_server_only()) {
            document.detach(source.node());
        }
        debug!(scripts = sources.len(), "Template parsed");

        let (state_tx, state_rx) = watch::channel(None);
        let template = Template {
            shared: Arc::new(Shared {
                config: self.config,
                state: state_rx,
                engine: self.engine,
                on_instance_ready: self.on_instance_ready,
            }),
        };

        let planner = BundlePlanner::new(options);
        let on_prepared = self.on_prepared;
        let prepared_template = template.clone();
        let (barrier, notify) = ScriptLoadBarrier::new(sources.clone(), options.is_verbose(), move |scripts| {
            let mut document = document;
            let bundles = planner.plan(&mut document, &scripts);
            verbose!(
                options.is_verbose(),
                bundles = bundles.len(),
                scripts = scripts.len(),
                "Template ready"
            );
            state_tx.send_replace(Some(Arc::new(PreparedTemplate {
                document,
                bundles,
                scripts,
            })));
            if let Some(listener) = on_prepared {
                listener(prepared_template);
            }
        });

        for source in &sources {
            source.resolve(&self.loaders, notify.clone());
        }
        if !barrier.has_fired() {
            tokio::spawn(barrier.run());
        }

        Ok(template)
    }
}

struct Shared {
    config: TemplateConfig,
    state: watch::Receiver<Option<Arc<PreparedTemplate>>>,
    engine: Arc<dyn ScriptEngine>,
    on_instance_ready: Option<InstanceListener>,
}

/// Handle to a template. Cheap to clone.
#[derive(Clone)]
pub struct Template {
    shared: Arc<Shared>,
}

impl Template {
    pub fn builder(config: TemplateConfig) -> TemplateBuilder {
        TemplateBuilder::new(config)
    }

    /// Builds with default collaborators: disk, HTTP, and no script execution.
    pub fn load(config: TemplateConfig) -> Result<Self, TemplateError> {
        TemplateBuilder::new(config).build()
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.shared.config
    }

    pub fn options(&self) -> TemplateOptions {
        self.shared.config.options
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.borrow().is_some()
    }

    /// The prepared template, or `None` while still loading.
    pub fn prepared(&self) -> Option<Arc<PreparedTemplate>> {
        self.shared.state.borrow().clone()
    }

    /// Waits until the template is ready. Resolves immediately if it already is.
    ///
    /// There is no timeout: a script that never resolves keeps this pending.
    pub async fn ready(&self) -> Result<Arc<PreparedTemplate>, TemplateError> {
        let mut state = self.shared.state.clone();
        let prepared = state
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TemplateError::Abandoned)?
            .clone();
        prepared.ok_or(TemplateError::Abandoned)
    }

    /// The request entry point for host frameworks.
    pub fn middleware(&self) -> Middleware {
        Middleware::new(self.clone())
    }

    /// Renders one request: clones the prepared document, points it at the request URL,
    /// runs every script in document order, notifies the instance-ready listener and sends
    /// once nothing is pending.
    ///
    /// On error the responder is dropped unsent and the prepared template is untouched.
    pub(crate) fn render(
        &self,
        prepared: &PreparedTemplate,
        uri: &http::Uri,
        responder: Box<dyn HttpResponder>,
    ) -> Result<ResponseHandle, TemplateError> {
        let mut document = prepared.document.clone();
        let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
        document.set_location(format!("{}{}", self.shared.config.base_url.trim_end_matches('/'), path));

        for script in &prepared.scripts {
            self.shared.engine.execute(&mut document, script.content())?;
        }

        let response = ResponseHandle::new(document, responder, self.shared.engine.clone());
        if let Some(listener) = &self.shared.on_instance_ready {
            listener(response.clone());
        }
        response.settle();
        Ok(response)
    }
}
