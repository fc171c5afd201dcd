//! Keeps a partitioned stylesheet in sync with the classes a host document
//! uses.

pub mod detector;
pub mod document;
pub mod fs_host;
pub mod partition;

use crate::cache::CacheStats;
use crate::compiler::GenerationResult;
use crate::config::Config;
use crate::context::Context;
use crate::incremental::{IncrementalParser, ParserStats};
use crate::preflight;
use crate::registry::{UtilityCategory, UtilityRegistry};
use detector::{ChangeDetector, DetectedBatch};
use document::DocumentHost;
use indexmap::IndexSet;
use partition::{InsertionPoint, StylePartitionManager};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STYLE_ID: &str = "barocss-runtime";
pub const DEFAULT_MAX_RULES_PER_PARTITION: usize = 50;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub config: Config,
    pub style_id: String,
    pub insertion_point: InsertionPoint,
    pub max_rules_per_partition: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            style_id: DEFAULT_STYLE_ID.to_string(),
            insertion_point: InsertionPoint::Head,
            max_rules_per_partition: DEFAULT_MAX_RULES_PER_PARTITION,
        }
    }
}

impl RuntimeOptions {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub struct ObserveOptions<'a> {
    /// Compile the classes already present under the root before watching.
    pub scan: bool,
    /// Runs once layout rules are in place and before paint rules are added.
    pub on_ready: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> ObserveOptions<'a> {
    pub fn scan() -> Self {
        Self {
            scan: true,
            on_ready: None,
        }
    }

    pub fn on_ready(mut self, callback: impl FnOnce() + 'a) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub classes: usize,
    pub partitions: usize,
    pub rules: usize,
    pub root_rules: usize,
    pub parser: ParserStats,
}

#[derive(Debug)]
pub struct Runtime {
    registry: UtilityRegistry,
    parser: IncrementalParser,
    detector: ChangeDetector,
    partitions: StylePartitionManager,
    classes: IndexSet<String>,
}

impl Runtime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self::with_registry(options, UtilityRegistry::with_builtins())
    }

    /// `registry` is kept and reused whenever the configuration changes.
    pub fn with_registry(options: RuntimeOptions, registry: UtilityRegistry) -> Self {
        let RuntimeOptions {
            config,
            style_id,
            insertion_point,
            max_rules_per_partition,
        } = options;
        let context = Context::with_registry(config, registry.clone());
        let mut runtime = Self {
            registry,
            parser: IncrementalParser::new(Arc::new(context)),
            detector: ChangeDetector::inert(),
            partitions: StylePartitionManager::new(
                style_id,
                insertion_point,
                max_rules_per_partition,
            ),
            classes: IndexSet::new(),
        };
        runtime.install_fixed_slots();
        runtime
    }

    fn install_fixed_slots(&mut self) {
        let context = self.parser.context();
        let preflight = preflight::stylesheet(context.settings().preflight);
        let vars = context.css_vars();
        self.partitions.set_preflight(preflight);
        self.partitions.set_css_vars(&vars);
    }

    pub fn context(&self) -> &Arc<Context> {
        self.parser.context()
    }

    pub fn partitions(&self) -> &StylePartitionManager {
        &self.partitions
    }

    /// Compiles a whitespace-separated class list and appends the new rules.
    /// Returns how many classes produced CSS.
    pub fn add_class(&mut self, classes: &str) -> usize {
        let tokens = classes.split_whitespace().collect::<Vec<_>>();
        self.classes.extend(tokens.iter().map(|class| class.to_string()));
        let results = self.parser.process_classes(&tokens);
        self.partitions.insert(&results);
        results.len()
    }

    /// Forgets the classes. Rules already injected stay in place.
    pub fn remove_class(&mut self, classes: &str) {
        for class in classes.split_whitespace() {
            self.classes.shift_remove(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class.trim())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Forgets every tracked class. Injected rules stay in place.
    pub fn clear(&mut self) {
        self.classes.clear();
    }

    /// Empties the stylesheet and every cache, keeping the containers.
    pub fn reset(&mut self) {
        self.classes.clear();
        self.parser.clear_processed();
        self.parser.context().clear_cache();
        self.partitions.reset();
        self.install_fixed_slots();
    }

    /// Rebuilds the context and regenerates every known class against it.
    pub fn update_config(&mut self, config: Config) {
        let cache = self.parser.context().cache().clone();
        let context = Context::with_cache(config, self.registry.clone(), cache);
        self.parser.set_context(Arc::new(context));
        self.partitions.reset();
        self.install_fixed_slots();

        let known = self.classes.iter().cloned().collect::<Vec<_>>();
        let results = self.parser.process_classes(&known);
        tracing::debug!(classes = known.len(), rules = results.len(), "config updated");
        self.partitions.insert(&results);
    }

    /// Stops observing and unmounts every partition.
    pub fn destroy(&mut self) {
        self.detector.detach();
        self.partitions.teardown();
        self.classes.clear();
        self.parser.clear_processed();
    }

    /// Optionally scans the root, then subscribes to the host. Without a host,
    /// or when subscribing fails, the runtime keeps working without change
    /// detection. Returns whether change detection is active.
    pub fn observe<H: DocumentHost>(
        &mut self,
        host: Option<&mut H>,
        root: &H::Root,
        options: ObserveOptions<'_>,
    ) -> bool {
        let ObserveOptions { scan, on_ready } = options;
        match (scan, host.as_deref()) {
            (true, Some(host)) => {
                self.scan(host, root, on_ready);
            }
            _ => {
                if let Some(callback) = on_ready {
                    callback();
                }
            }
        }
        self.detector = ChangeDetector::attach(host, root);
        self.detector.is_active()
    }

    /// Compiles every class under `root` once. Layout rules are applied
    /// first, then `on_ready` runs, then paint rules are applied.
    pub fn scan<H: DocumentHost>(
        &mut self,
        host: &H,
        root: &H::Root,
        on_ready: Option<Box<dyn FnOnce() + '_>>,
    ) -> usize {
        let mut tokens = IndexSet::new();
        for attr in host.collect(root) {
            tokens.extend(attr.tokens().map(str::to_string));
        }
        self.classes.extend(tokens.iter().cloned());
        let results = self.parser.process_classes(&tokens);

        let (layout, paint): (Vec<GenerationResult>, Vec<GenerationResult>) = results
            .into_iter()
            .partition(|result| result.category == UtilityCategory::Layout);
        tracing::debug!(
            layout = layout.len(),
            paint = paint.len(),
            "initial scan compiled"
        );
        self.partitions.insert(&layout);
        if let Some(callback) = on_ready {
            callback();
        }
        self.partitions.insert(&paint);
        layout.len() + paint.len()
    }

    pub fn is_observing(&self) -> bool {
        self.detector.is_active()
    }

    /// Applies every batch the host has delivered so far. Returns the number
    /// of classes that produced CSS.
    pub fn process_pending(&mut self) -> usize {
        let batches = self.detector.drain(&mut self.parser);
        batches
            .into_iter()
            .map(|batch| self.apply_batch(batch))
            .sum()
    }

    /// Waits up to `timeout` for one batch and applies it.
    pub fn wait_for_batch(&mut self, timeout: Duration) -> Option<usize> {
        let batch = self.detector.wait(&mut self.parser, timeout)?;
        Some(self.apply_batch(batch))
    }

    fn apply_batch(&mut self, batch: DetectedBatch) -> usize {
        self.classes.extend(batch.classes);
        self.partitions.insert(&batch.results);
        batch.results.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.parser.context().cache().stats()
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            classes: self.classes.len(),
            partitions: self.partitions.partition_count(),
            rules: self.partitions.rule_count(),
            root_rules: self.partitions.root_rules().len(),
            parser: self.parser.stats(),
        }
    }

    /// The full stylesheet text, slots first.
    pub fn stylesheet(&self) -> String {
        self.partitions.render()
    }
}

impl std::fmt::Debug for ObserveOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserveOptions")
            .field("scan", &self.scan)
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}
