//! Wait/done bookkeeping for one request.

/// Counts outstanding asynchronous work and guards the single send.
///
/// The counter only decides *whether* to send; the caller performs the emission when a
/// method returns `true`. Every method that can return `true` does so at most once over
/// the counter's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestWaitCounter {
    count: usize,
    sent: bool,
}

impl RequestWaitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more piece of pending work.
    pub fn wait(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Marks one piece of work finished. Returns `true` if the response must be sent now.
    ///
    /// Extra calls never take the count below zero and never trigger a second send.
    pub fn done(&mut self) -> bool {
        self.count = self.count.saturating_sub(1);
        self.count == 0 && self.claim_send()
    }

    /// Called once script execution and listeners have run. Returns `true` if nothing is
    /// pending and the response has not gone out yet.
    pub fn settle(&mut self) -> bool {
        self.count == 0 && self.claim_send()
    }

    /// Claims the send regardless of pending work.
    pub fn claim_send(&mut self) -> bool {
        !std::mem::replace(&mut self.sent, true)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }
}
