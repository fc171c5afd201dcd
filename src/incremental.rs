use crate::cache::CacheStats;
use crate::compiler::{GenerationResult, generate_class};
use crate::context::Context;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub processed: usize,
    pub cache: CacheStats,
}

/// Compiles batches of classes, skipping the ones already seen this session.
#[derive(Debug)]
pub struct IncrementalParser {
    context: Arc<Context>,
    processed: IndexSet<String>,
}

impl IncrementalParser {
    pub fn new(context: Arc<Context>) -> Self {
        Self {
            context,
            processed: IndexSet::new(),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Swaps the context and forgets every processed class.
    pub fn set_context(&mut self, context: Arc<Context>) {
        self.context = context;
        self.processed.clear();
    }

    pub fn process_classes<I, S>(&mut self, classes: I) -> Vec<GenerationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.process_classes_with(classes, false)
    }

    /// With `include_processed`, classes from earlier batches are returned
    /// again (from the cache) instead of being skipped.
    pub fn process_classes_with<I, S>(
        &mut self,
        classes: I,
        include_processed: bool,
    ) -> Vec<GenerationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = HashSet::new();
        let mut results = Vec::new();

        for class in classes {
            let class = class.as_ref().trim();
            if class.is_empty() || !batch.insert(class.to_string()) {
                continue;
            }
            if self.processed.contains(class) && !include_processed {
                continue;
            }
            if let Some(result) = generate_class(class, &self.context) {
                results.push(result);
            }
            self.processed.insert(class.to_string());
        }

        results
    }

    pub fn is_processed(&self, class: &str) -> bool {
        self.processed.contains(class.trim())
    }

    /// Empties the ledger; compiled entries stay cached.
    pub fn clear_processed(&mut self) {
        self.processed.clear();
    }

    pub fn processed(&self) -> impl Iterator<Item = &str> {
        self.processed.iter().map(String::as_str)
    }

    pub fn stats(&self) -> ParserStats {
        ParserStats {
            processed: self.processed.len(),
            cache: self.context.cache().stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IncrementalParser;
    use crate::config::Config;
    use crate::context::Context;
    use std::sync::Arc;

    fn parser() -> IncrementalParser {
        IncrementalParser::new(Arc::new(Context::new(Config::default())))
    }

    #[test]
    fn second_batch_is_empty() {
        let mut parser = parser();
        let first = parser.process_classes(["p-4", "p-4", "m-2"]);
        let names = first
            .iter()
            .map(|result| result.class_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["p-4", "m-2"]);
        assert!(parser.process_classes(["p-4", "p-4", "m-2"]).is_empty());
    }

    #[test]
    fn unmatched_classes_are_still_marked() {
        let mut parser = parser();
        assert!(parser.process_classes(["not-a-utility"]).is_empty());
        assert!(parser.is_processed("not-a-utility"));
    }

    #[test]
    fn clear_processed_keeps_cache() {
        let mut parser = parser();
        parser.process_classes(["p-4"]);
        parser.clear_processed();
        assert!(!parser.is_processed("p-4"));
        assert_eq!(parser.process_classes(["p-4"]).len(), 1);
        let stats = parser.stats();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.cache.css_hits, 1);
    }

    #[test]
    fn include_processed_returns_earlier_results() {
        let mut parser = parser();
        parser.process_classes(["p-4"]);
        let again = parser.process_classes_with(["p-4", "m-2"], true);
        assert_eq!(again.len(), 2);
    }
}
