use crate::compiler::GenerationResult;
use indexmap::IndexSet;

/// Where the stylesheet containers are mounted in the host document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InsertionPoint {
    #[default]
    Head,
    Body,
    /// Id of a host element.
    Element(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleContainer {
    pub id: String,
    pub rules: Vec<String>,
}

impl StyleContainer {
    fn new(id: String) -> Self {
        Self {
            id,
            rules: Vec::new(),
        }
    }

    pub fn css(&self) -> String {
        self.rules.join("\n")
    }
}

/// Rule containers for the live stylesheet.
///
/// Three fixed slots come first: preflight and theme variables, which are
/// replaced wholesale, and hoisted root rules, which are appended once per
/// distinct text. Class rules are appended to numbered partitions of at most
/// `max_rules` entries each. Nothing is ever removed except by `reset` or
/// `teardown`.
#[derive(Debug)]
pub struct StylePartitionManager {
    style_id: String,
    insertion_point: InsertionPoint,
    max_rules: usize,
    preflight: StyleContainer,
    css_vars: StyleContainer,
    root: StyleContainer,
    root_seen: IndexSet<String>,
    partitions: Vec<StyleContainer>,
    active: usize,
}

impl StylePartitionManager {
    pub fn new(
        style_id: impl Into<String>,
        insertion_point: InsertionPoint,
        max_rules: usize,
    ) -> Self {
        let style_id = style_id.into();
        Self {
            preflight: StyleContainer::new(format!("{}-preflight", style_id)),
            css_vars: StyleContainer::new(format!("{}-vars", style_id)),
            root: StyleContainer::new(format!("{}-root", style_id)),
            root_seen: IndexSet::new(),
            partitions: Vec::new(),
            active: 0,
            max_rules: max_rules.max(1),
            insertion_point,
            style_id,
        }
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn insertion_point(&self) -> &InsertionPoint {
        &self.insertion_point
    }

    pub fn max_rules(&self) -> usize {
        self.max_rules
    }

    pub fn set_preflight(&mut self, css: &str) {
        replace_contents(&mut self.preflight, css);
    }

    pub fn set_css_vars(&mut self, css: &str) {
        replace_contents(&mut self.css_vars, css);
    }

    /// Returns how many of the rules were new.
    pub fn add_root_rules<I, S>(&mut self, rules: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for rule in rules {
            let rule = rule.into();
            if rule.is_empty() || !self.root_seen.insert(rule.clone()) {
                continue;
            }
            self.root.rules.push(rule);
            added += 1;
        }
        added
    }

    pub fn insert_rule(&mut self, css: impl Into<String>) {
        let css = css.into();
        if css.is_empty() {
            return;
        }
        let index = self.writable_partition();
        self.partitions[index].rules.push(css);
    }

    pub fn insert(&mut self, results: &[GenerationResult]) {
        for result in results {
            self.add_root_rules(result.root_rules.iter().cloned());
            self.insert_rule(result.css.clone());
        }
    }

    fn writable_partition(&mut self) -> usize {
        while self.active < self.partitions.len()
            && self.partitions[self.active].rules.len() >= self.max_rules
        {
            self.active += 1;
        }
        if self.active == self.partitions.len() {
            let id = format!("{}-{}", self.style_id, self.partitions.len());
            tracing::debug!(id = %id, "opening style partition");
            self.partitions.push(StyleContainer::new(id));
        }
        self.active
    }

    pub fn partitions(&self) -> &[StyleContainer] {
        &self.partitions
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn rule_count(&self) -> usize {
        self.partitions.iter().map(|partition| partition.rules.len()).sum()
    }

    pub fn root_rules(&self) -> &[String] {
        &self.root.rules
    }

    pub fn preflight(&self) -> &StyleContainer {
        &self.preflight
    }

    pub fn css_vars(&self) -> &StyleContainer {
        &self.css_vars
    }

    /// Every container id in document order.
    pub fn container_ids(&self) -> Vec<&str> {
        [&self.preflight, &self.css_vars, &self.root]
            .into_iter()
            .chain(self.partitions.iter())
            .map(|container| container.id.as_str())
            .collect()
    }

    /// Empties every container but keeps them mounted.
    pub fn reset(&mut self) {
        self.preflight.rules.clear();
        self.css_vars.rules.clear();
        self.root.rules.clear();
        self.root_seen.clear();
        for partition in &mut self.partitions {
            partition.rules.clear();
        }
        self.active = 0;
    }

    /// Unmounts all class partitions and empties the fixed slots.
    pub fn teardown(&mut self) {
        self.reset();
        self.partitions.clear();
    }

    pub fn render(&self) -> String {
        [&self.preflight, &self.css_vars, &self.root]
            .into_iter()
            .chain(self.partitions.iter())
            .filter(|container| !container.rules.is_empty())
            .map(StyleContainer::css)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn replace_contents(container: &mut StyleContainer, css: &str) {
    container.rules.clear();
    if !css.trim().is_empty() {
        container.rules.push(css.trim_end().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{InsertionPoint, StylePartitionManager};
    use crate::compiler::GenerationResult;
    use crate::registry::UtilityCategory;

    fn manager(max: usize) -> StylePartitionManager {
        StylePartitionManager::new("test", InsertionPoint::Head, max)
    }

    #[test]
    fn partitions_hold_at_most_max_rules() {
        let mut manager = manager(3);
        for idx in 0..7 {
            manager.insert_rule(format!(".r{} {{ order: {}; }}", idx, idx));
        }
        assert_eq!(manager.partition_count(), 3);
        let sizes = manager
            .partitions()
            .iter()
            .map(|partition| partition.rules.len())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(
            manager.container_ids(),
            vec!["test-preflight", "test-vars", "test-root", "test-0", "test-1", "test-2"]
        );
    }

    #[test]
    fn zero_max_is_clamped() {
        let mut manager = manager(0);
        manager.insert_rule(".a {}");
        manager.insert_rule(".b {}");
        assert_eq!(manager.max_rules(), 1);
        assert_eq!(manager.partition_count(), 2);
    }

    #[test]
    fn root_rules_are_deduplicated() {
        let mut manager = manager(10);
        let result = GenerationResult {
            class_name: "animate-spin".to_string(),
            css: ".animate-spin { animation: spin 1s linear infinite; }".to_string(),
            root_rules: vec!["@keyframes spin { to { transform: rotate(360deg); } }".to_string()],
            category: UtilityCategory::Paint,
        };
        manager.insert(&[result.clone(), result]);
        assert_eq!(manager.root_rules().len(), 1);
        assert_eq!(manager.rule_count(), 2);
    }

    #[test]
    fn fixed_slots_are_replaced() {
        let mut manager = manager(10);
        manager.set_preflight("*, ::before { box-sizing: border-box; }");
        manager.set_css_vars(":root { --a: 1; }");
        manager.set_css_vars(":root { --a: 2; }");
        manager.insert_rule(".p-4 { padding: 1rem; }");
        assert_eq!(
            manager.render(),
            "*, ::before { box-sizing: border-box; }\n:root { --a: 2; }\n.p-4 { padding: 1rem; }"
        );
    }

    #[test]
    fn reset_keeps_containers_and_teardown_drops_them() {
        let mut manager = manager(1);
        manager.insert_rule(".a {}");
        manager.insert_rule(".b {}");
        manager.add_root_rules([":root { --x: 1; }"]);
        manager.reset();
        assert_eq!(manager.partition_count(), 2);
        assert_eq!(manager.rule_count(), 0);
        assert!(manager.root_rules().is_empty());
        assert_eq!(manager.render(), "");

        manager.insert_rule(".c {}");
        assert_eq!(manager.partitions()[0].rules, vec![".c {}"]);
        assert_eq!(manager.partition_count(), 2);

        manager.teardown();
        assert_eq!(manager.partition_count(), 0);
        assert_eq!(manager.container_ids().len(), 3);
    }
}
