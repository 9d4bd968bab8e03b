//! # Load Barrier
//!
//! Fan-in for a template's scripts. The barrier owns every [`ScriptSource`] of the template
//! and the receiving end of the loaders' channel. Each [`ScriptLoaded`] notification is
//! applied on the barrier's own turn, and the completion check runs right after it, so the
//! notification that completes the set fires the barrier with no extra scheduler hop.
//!
//! **Concurrency Model**: loader tasks only send messages; the barrier is the single owner
//! of source state, so no locking is needed.

use crate::framework::{ScriptLoaded, ScriptSource};
use crate::lifecycle::verbose;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::{debug, warn};

type Completion = Box<dyn FnOnce(Vec<ScriptSource>) + Send>;

/// Waits for a fixed set of scripts and fires once when all of them have resolved.
pub struct ScriptLoadBarrier {
    receiver: mpsc::Receiver<ScriptLoaded>,
    sources: Vec<ScriptSource>,
    pending: BTreeSet<usize>,
    fired: bool,
    verbose: bool,
    on_complete: Option<Completion>,
}

impl ScriptLoadBarrier {
    /// Creates the barrier and the sender loaders report to.
    ///
    /// `on_complete` receives the fully loaded sources. With no sources at all, it runs
    /// before `new` returns.
    pub fn new(
        sources: Vec<ScriptSource>,
        verbose: bool,
        on_complete: impl FnOnce(Vec<ScriptSource>) + Send + 'static,
    ) -> (Self, mpsc::Sender<ScriptLoaded>) {
        let (sender, receiver) = mpsc::channel(sources.len().max(1));
        let pending = sources
            .iter()
            .filter(|s| !s.is_loaded())
            .map(ScriptSource::index)
            .collect();
        let mut barrier = Self {
            receiver,
            sources,
            pending,
            fired: false,
            verbose,
            on_complete: Some(Box::new(on_complete)),
        };
        barrier.check_complete();
        (barrier, sender)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Number of sources still loading.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies one load notification and returns `true` if it completed the set.
    ///
    /// Notifications after firing, for unknown indices, or for sources that already
    /// resolved are ignored.
    pub fn notify(&mut self, loaded: ScriptLoaded) -> bool {
        if self.fired {
            debug!(index = loaded.index, "Barrier already fired, notification ignored");
            return false;
        }
        let Some(source) = self.sources.iter_mut().find(|s| s.index() == loaded.index) else {
            warn!(index = loaded.index, "Notification for unknown script");
            return false;
        };
        if !source.set_content(loaded.content) {
            warn!(index = loaded.index, "Duplicate load notification ignored");
            return false;
        }
        self.pending.remove(&loaded.index);
        verbose!(
            self.verbose,
            index = loaded.index,
            origin = source.origin().kind(),
            pending = self.pending.len(),
            "Script loaded"
        );
        self.check_complete()
    }

    /// Processes notifications until the barrier fires or every loader is gone.
    pub async fn run(mut self) {
        debug!(pending = self.pending.len(), "Barrier waiting");
        while !self.fired {
            match self.receiver.recv().await {
                Some(loaded) => {
                    self.notify(loaded);
                }
                None => {
                    warn!(pending = self.pending.len(), "Loaders stopped before every script resolved");
                    break;
                }
            }
        }
    }

    fn check_complete(&mut self) -> bool {
        if self.fired || !self.pending.is_empty() {
            return false;
        }
        self.fired = true;
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(std::mem::take(&mut self.sources));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    fn sources(count: usize) -> Vec<ScriptSource> {
        let markup = "<script>s</script>".repeat(count);
        let doc = Document::parse(&markup);
        doc.elements_by_tag_name("script")
            .into_iter()
            .enumerate()
            .map(|(i, node)| ScriptSource::from_element(&doc, node, i, Path::new(".")))
            .collect()
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<String>>>>, impl FnOnce(Vec<ScriptSource>) + Send + 'static) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let on_complete = move |scripts: Vec<ScriptSource>| {
            let contents = scripts.iter().map(|s| s.content().to_string()).collect();
            sink.lock().unwrap().push(contents);
        };
        (fired, on_complete)
    }

    #[test]
    fn test_fires_once_after_every_source() {
        let (fired, on_complete) = recorder();
        let (mut barrier, _sender) = ScriptLoadBarrier::new(sources(3), false, on_complete);

        assert!(!barrier.notify(ScriptLoaded { index: 2, content: "c".into() }));
        assert!(!barrier.notify(ScriptLoaded { index: 0, content: "a".into() }));
        assert!(fired.lock().unwrap().is_empty());
        assert_eq!(barrier.pending(), 1);

        assert!(barrier.notify(ScriptLoaded { index: 1, content: "b".into() }));
        assert!(barrier.has_fired());
        assert_eq!(*fired.lock().unwrap(), vec![vec!["a".to_string(), "b".into(), "c".into()]]);

        assert!(!barrier.notify(ScriptLoaded { index: 1, content: "again".into() }));
        assert_eq!(fired.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_notification_does_not_complete_set() {
        let (fired, on_complete) = recorder();
        let (mut barrier, _sender) = ScriptLoadBarrier::new(sources(2), false, on_complete);

        assert!(!barrier.notify(ScriptLoaded { index: 0, content: "a".into() }));
        assert!(!barrier.notify(ScriptLoaded { index: 0, content: "a2".into() }));
        assert!(!barrier.notify(ScriptLoaded { index: 7, content: "x".into() }));
        assert!(fired.lock().unwrap().is_empty());

        assert!(barrier.notify(ScriptLoaded { index: 1, content: "b".into() }));
        assert_eq!(*fired.lock().unwrap(), vec![vec!["a".to_string(), "b".into()]]);
    }

    #[test]
    fn test_empty_set_fires_during_construction() {
        let (fired, on_complete) = recorder();
        let (barrier, _sender) = ScriptLoadBarrier::new(Vec::new(), false, on_complete);
        assert!(barrier.has_fired());
        assert_eq!(*fired.lock().unwrap(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_run_drains_channel_until_fired() {
        let (fired, on_complete) = recorder();
        let (barrier, sender) = ScriptLoadBarrier::new(sources(2), true, on_complete);
        let handle = tokio::spawn(barrier.run());

        sender.send(ScriptLoaded { index: 1, content: "b".into() }).await.unwrap();
        sender.send(ScriptLoaded { index: 0, content: "a".into() }).await.unwrap();
        handle.await.unwrap();

        assert_eq!(*fired.lock().unwrap(), vec![vec!["a".to_string(), "b".into()]]);
    }

    #[tokio::test]
    async fn test_run_stops_when_loaders_disappear() {
        let (fired, on_complete) = recorder();
        let (barrier, sender) = ScriptLoadBarrier::new(sources(2), false, on_complete);
        let handle = tokio::spawn(barrier.run());

        sender.send(ScriptLoaded { index: 0, content: "a".into() }).await.unwrap();
        drop(sender);
        handle.await.unwrap();

        assert!(fired.lock().unwrap().is_empty());
    }
}
