//! A document host backed by a directory of source files.

use crate::error::{HostError, ScanError};
use crate::runtime::document::{ClassAttr, DocumentHost, MutationBatch, MutationRecord};
use crate::scanner::{PathFilter, ScanOptions, glob_root, scan_file};
use notify::{Event, PollWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Treats every file matching the patterns as an element whose class
/// attribute is the list of candidates found in it. The root is the
/// directory the patterns are relative to.
pub struct FsHost {
    patterns: Vec<String>,
    filter: PathFilter,
    poll_interval: Option<Duration>,
    watcher: Option<Box<dyn Watcher>>,
}

impl FsHost {
    pub fn new(patterns: Vec<String>, ignore: Vec<String>) -> Result<Self, ScanError> {
        Self::with_options(patterns, ignore, ScanOptions::default())
    }

    pub fn with_options(
        patterns: Vec<String>,
        ignore: Vec<String>,
        options: ScanOptions,
    ) -> Result<Self, ScanError> {
        let filter = PathFilter::new(&patterns, &ignore, options)?;
        Ok(Self {
            patterns,
            filter,
            poll_interval: None,
            watcher: None,
        })
    }

    /// Polls instead of using native file-system notifications.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn unwatch(&mut self) {
        self.watcher = None;
    }

    fn watch_dirs(&self, base: &Path) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        for pattern in &self.patterns {
            let dir = base.join(glob_root(pattern));
            if dir.is_dir() && seen.insert(dir.clone()) {
                dirs.push(dir);
            }
        }
        if dirs.is_empty() {
            dirs.push(base.to_path_buf());
        }
        dirs
    }
}

impl DocumentHost for FsHost {
    type Root = PathBuf;

    fn collect(&self, root: &PathBuf) -> Vec<ClassAttr> {
        let filter = self.filter.rebased(root.clone());
        let files = match filter.walk() {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(error = %err, "scan failed");
                return Vec::new();
            }
        };
        files
            .iter()
            .map(|file| ClassAttr::Plain(scan_file(file).join(" ")))
            .filter(|attr| !attr.value().is_empty())
            .collect()
    }

    fn subscribe(
        &mut self,
        root: &PathBuf,
        sender: Sender<MutationBatch>,
    ) -> Result<(), HostError> {
        let base = root.canonicalize().map_err(|_| HostError::Unavailable)?;
        let filter = self.filter.rebased(base.clone());
        let handler = move |event: notify::Result<Event>| {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "watch error");
                    return;
                }
            };
            if event.kind.is_access() || event.kind.is_remove() {
                return;
            }
            let classes = event
                .paths
                .iter()
                .filter(|path| path.is_file() && filter.matches(path))
                .map(|path| ClassAttr::Plain(scan_file(path).join(" ")))
                .filter(|attr| !attr.value().is_empty())
                .collect::<Vec<_>>();
            if classes.is_empty() {
                return;
            }
            let batch = MutationBatch::new(vec![MutationRecord::SubtreeAdded { classes }]);
            if sender.send(batch).is_err() {
                tracing::debug!("runtime stopped listening");
            }
        };

        let mut watcher: Box<dyn Watcher> = match self.poll_interval {
            Some(interval) => Box::new(PollWatcher::new(
                handler,
                notify::Config::default().with_poll_interval(interval),
            )?),
            None => Box::new(notify::recommended_watcher(handler)?),
        };
        for dir in self.watch_dirs(&base) {
            watcher.watch(&dir, RecursiveMode::Recursive)?;
            tracing::debug!(dir = %dir.display(), "watching");
        }
        self.watcher = Some(watcher);
        Ok(())
    }
}

impl std::fmt::Debug for FsHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsHost")
            .field("patterns", &self.patterns)
            .field("poll_interval", &self.poll_interval)
            .field("watching", &self.watcher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FsHost;
    use crate::error::HostError;
    use crate::runtime::document::DocumentHost;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::mpsc::channel;

    #[test]
    fn collect_reads_each_matching_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.html"), r#"<div class="p-4 flex"></div>"#).expect("write");
        fs::write(dir.path().join("b.html"), r#"<div class="m-2"></div>"#).expect("write");
        fs::write(dir.path().join("notes.txt"), r#"class="hidden""#).expect("write");

        let host = FsHost::new(vec!["*.html".to_string()], Vec::new()).expect("host");
        let values = host
            .collect(&dir.path().to_path_buf())
            .iter()
            .map(|attr| attr.value().to_string())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["p-4 flex", "m-2"]);
    }

    #[test]
    fn missing_root_is_unavailable() {
        let mut host = FsHost::new(vec!["*.html".to_string()], Vec::new()).expect("host");
        let (tx, _rx) = channel();
        let result = host.subscribe(&PathBuf::from("/no/such/dir/for/barocss"), tx);
        assert!(matches!(result, Err(HostError::Unavailable)));
        assert!(!host.is_watching());
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(FsHost::new(vec!["src/[".to_string()], Vec::new()).is_err());
        assert!(FsHost::new(Vec::new(), Vec::new()).is_err());
    }
}
