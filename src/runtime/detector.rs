use crate::compiler::GenerationResult;
use crate::incremental::IncrementalParser;
use crate::runtime::document::{DocumentHost, MutationBatch};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError, channel};
use std::time::Duration;

/// Result of one mutation batch: the class tokens seen and the rules newly
/// generated for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedBatch {
    pub classes: Vec<String>,
    pub results: Vec<GenerationResult>,
}

/// Receives mutation batches from a host. Without a host it stays inert and
/// every drain is empty.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    receiver: Option<Receiver<MutationBatch>>,
}

impl ChangeDetector {
    pub fn inert() -> Self {
        Self::default()
    }

    pub fn attach<H: DocumentHost>(host: Option<&mut H>, root: &H::Root) -> Self {
        let Some(host) = host else {
            tracing::debug!("no document host, change detection disabled");
            return Self::inert();
        };
        let (sender, receiver) = channel();
        match host.subscribe(root, sender) {
            Ok(()) => Self {
                receiver: Some(receiver),
            },
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "document host unavailable, change detection disabled"
                );
                Self::inert()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn detach(&mut self) {
        self.receiver = None;
    }

    /// Processes every batch already delivered, one parser call each.
    pub fn drain(&mut self, parser: &mut IncrementalParser) -> Vec<DetectedBatch> {
        let mut out = Vec::new();
        while let Some(receiver) = &self.receiver {
            match receiver.try_recv() {
                Ok(batch) => out.push(process_batch(&batch, parser)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("document host went away");
                    self.receiver = None;
                }
            }
        }
        out
    }

    /// Blocks for the next batch. `None` on timeout or when inert.
    pub fn wait(
        &mut self,
        parser: &mut IncrementalParser,
        timeout: Duration,
    ) -> Option<DetectedBatch> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv_timeout(timeout) {
            Ok(batch) => Some(process_batch(&batch, parser)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("document host went away");
                self.receiver = None;
                None
            }
        }
    }
}

fn process_batch(batch: &MutationBatch, parser: &mut IncrementalParser) -> DetectedBatch {
    let classes = batch.class_tokens();
    let fresh = classes
        .iter()
        .filter(|class| !parser.is_processed(class))
        .collect::<Vec<_>>();
    let results = if fresh.is_empty() {
        Vec::new()
    } else {
        parser.process_classes(fresh)
    };
    tracing::debug!(
        records = batch.records.len(),
        classes = classes.len(),
        rules = results.len(),
        "mutation batch processed"
    );
    DetectedBatch { classes, results }
}
