//! Candidate class extraction from source text and file trees.

use crate::error::ScanError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
    pub include_node_modules: bool,
    pub include_stylesheets: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
            include_node_modules: false,
            include_stylesheets: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Unique candidates in discovery order.
    pub classes: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Glob patterns plus ignore patterns, compiled once and matched against
/// both the path relative to the base and the path as given.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    options: ScanOptions,
}

impl PathFilter {
    pub fn new(
        patterns: &[String],
        ignore: &[String],
        options: ScanOptions,
    ) -> Result<Self, ScanError> {
        if patterns.is_empty() {
            return Err(ScanError::NoPatterns);
        }
        Ok(Self {
            include: build_globset(patterns)?,
            exclude: build_globset(ignore)?,
            options,
        })
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn rebased(&self, base_path: PathBuf) -> Self {
        Self {
            options: ScanOptions {
                base_path,
                ..self.options.clone()
            },
            ..self.clone()
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.options.base_path).unwrap_or(path);
        if !self.include.is_match(relative) && !self.include.is_match(path) {
            return false;
        }
        if self.exclude.is_match(relative) || self.exclude.is_match(path) {
            return false;
        }
        !is_excluded_file(path, &self.options)
    }

    /// Walks the base path, honouring `.gitignore` unless disabled.
    pub fn walk(&self) -> Result<Vec<PathBuf>, ScanError> {
        let base = &self.options.base_path;
        if !base.exists() {
            return Err(ScanError::MissingPath(base.clone()));
        }
        let respect = self.options.respect_gitignore;
        let walker = WalkBuilder::new(base)
            .hidden(false)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }
            if self.matches(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

pub fn scan_patterns(
    patterns: &[String],
    ignore: &[String],
    options: &ScanOptions,
) -> Result<ScanOutput, ScanError> {
    let filter = PathFilter::new(patterns, ignore, options.clone())?;
    let files = filter.walk()?;
    let mut classes = IndexSet::new();
    for file in &files {
        classes.extend(scan_file(file));
    }
    Ok(ScanOutput {
        classes: classes.into_iter().collect(),
        files,
    })
}

/// Candidates from one file. Unreadable or non-UTF-8 files yield nothing.
pub fn scan_file(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            extract_classes_for(&text, ext.as_deref())
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "file skipped");
            Vec::new()
        }
    }
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| ScanError::InvalidGlob {
            pattern: pattern.clone(),
            message: err.to_string(),
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ScanError::GlobSet(err.to_string()))
}

/// Directory a glob pattern is anchored at, e.g. `src/` for `src/**/*.html`.
pub fn glob_root(pattern: &str) -> PathBuf {
    let Some(meta) = pattern.find(['*', '?', '[', '{']) else {
        let path = Path::new(pattern);
        if path.extension().is_some() {
            return match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
        }
        return path.to_path_buf();
    };
    let prefix = &pattern[..meta];
    match prefix.rfind(['/', '\\']) {
        Some(idx) if idx > 0 => PathBuf::from(&prefix[..idx]),
        _ => PathBuf::from("."),
    }
}

fn is_excluded_file(path: &Path, options: &ScanOptions) -> bool {
    if !options.include_node_modules
        && path
            .components()
            .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("css" | "scss" | "sass" | "less") => !options.include_stylesheets,
        Some(
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "ico" | "avif" | "woff" | "woff2" | "ttf"
            | "otf" | "pdf" | "zip" | "gz" | "mp4" | "webm" | "mp3",
        ) => true,
        Some("lock" | "lockb") => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Markup,
    Script,
    Other,
}

impl SourceKind {
    fn from_extension(ext: Option<&str>) -> Self {
        match ext {
            Some("html" | "htm" | "vue" | "svelte" | "astro" | "xml") => SourceKind::Markup,
            Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" | "rs") => SourceKind::Script,
            _ => SourceKind::Other,
        }
    }
}

pub fn extract_classes(text: &str) -> Vec<String> {
    extract_classes_for(text, None)
}

/// Extraction tuned by file extension: markup reads class attributes only,
/// scripts also read string literals and `clsx`-style helper calls.
pub fn extract_classes_for(text: &str, ext: Option<&str>) -> Vec<String> {
    let kind = SourceKind::from_extension(ext);
    let mut chunks = attribute_values(text);
    if kind != SourceKind::Markup {
        chunks.extend(string_literals(text));
    }
    if kind == SourceKind::Script {
        chunks.extend(helper_arguments(text));
    }

    let mut seen = IndexSet::new();
    for chunk in &chunks {
        for token in split_class_list(chunk) {
            if is_candidate(&token) {
                seen.insert(token);
            }
        }
    }
    seen.into_iter().collect()
}

const CLASS_ATTRIBUTES: [&str; 4] = ["class", "className", ":class", "class:list"];
const CLASS_HELPERS: [&str; 4] = ["clsx", "classnames", "cva", "tw"];

fn attribute_values(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for attr in CLASS_ATTRIBUTES {
        for (idx, _) in text.match_indices(attr) {
            if !is_word_boundary(text, idx, attr.len(), |c| c == '=') {
                continue;
            }
            let mut cursor = Cursor::new(text, idx + attr.len());
            cursor.skip_whitespace();
            if !cursor.eat('=') {
                continue;
            }
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(quote @ ('"' | '\'')) => {
                    cursor.bump();
                    out.push(cursor.quoted(quote));
                }
                Some('{') => {
                    let body = cursor.balanced('{', '}');
                    out.extend(string_literals(body));
                }
                Some(_) => out.push(cursor.take_while(|c| !c.is_whitespace() && c != '>')),
                None => {}
            }
        }
    }
    out
}

fn helper_arguments(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for helper in CLASS_HELPERS {
        for (idx, _) in text.match_indices(helper) {
            if !is_word_boundary(text, idx, helper.len(), |c| c == '(' || c == '`') {
                continue;
            }
            let mut cursor = Cursor::new(text, idx + helper.len());
            cursor.skip_whitespace();
            if cursor.peek() != Some('(') {
                continue;
            }
            let args = cursor.balanced('(', ')');
            out.extend(object_keys(args));
        }
    }
    out
}

/// Contents of every quoted or template literal. Template substitutions
/// split the literal into separate chunks.
fn string_literals(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = Cursor::new(text, 0);
    while let Some(ch) = cursor.bump() {
        match ch {
            '"' | '\'' => {
                let value = cursor.quoted(ch);
                if !value.is_empty() {
                    out.push(value);
                }
            }
            '`' => out.extend(cursor.template()),
            _ => {}
        }
    }
    out
}

/// Bare identifiers used as object keys, e.g. `{ flex: on }`.
fn object_keys(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = Cursor::new(text, 0);
    let mut after_brace_or_comma = false;
    while let Some(ch) = cursor.peek() {
        match ch {
            '"' | '\'' => {
                cursor.bump();
                cursor.quoted(ch);
                after_brace_or_comma = false;
            }
            '`' => {
                cursor.bump();
                cursor.template();
                after_brace_or_comma = false;
            }
            '{' | ',' => {
                cursor.bump();
                after_brace_or_comma = true;
            }
            c if c.is_whitespace() => {
                cursor.bump();
            }
            c if after_brace_or_comma && is_ident_char(c) => {
                let ident = cursor.take_while(|c| is_ident_char(c) || c == '-');
                let mut ahead = cursor.clone();
                ahead.skip_whitespace();
                if ahead.peek() == Some(':') {
                    out.push(ident);
                }
                after_brace_or_comma = false;
            }
            _ => {
                cursor.bump();
                after_brace_or_comma = false;
            }
        }
    }
    out
}

/// Splits on whitespace outside of brackets and parentheses.
fn split_class_list(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                continue;
            }
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_candidate(token: &str) -> bool {
    if token.starts_with(['.', '/', '#']) || token.ends_with([':', '\\', '-']) {
        return false;
    }
    if !token.chars().any(|c| c.is_ascii_alphabetic() || c == '[') {
        return false;
    }

    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in token.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(open) = quote {
            match ch {
                '\\' => escaped = true,
                c if c == open => quote = None,
                _ => {}
            }
            continue;
        }
        let nested = brackets > 0 || parens > 0;
        match ch {
            '\\' => escaped = true,
            '[' => brackets += 1,
            ']' if brackets == 0 => return false,
            ']' => brackets -= 1,
            '(' => parens += 1,
            ')' if parens == 0 => return false,
            ')' => parens -= 1,
            '\'' | '"' if nested => quote = Some(ch),
            '\'' | '"' | '>' | '&' | ',' | '+' if !nested => return false,
            '!' if !nested && idx > 0 && idx + 1 != token.len() => return false,
            c if c.is_ascii_alphanumeric() => {}
            '-' | '_' | '/' | ':' | '.' | '%' | '#' | '!' | '@' | '*' | '=' | '>' | '&' | ','
            | '+' | '~' | '$' => {}
            _ if nested => {}
            _ => return false,
        }
    }
    brackets == 0 && parens == 0 && quote.is_none()
}

fn is_word_boundary(
    text: &str,
    idx: usize,
    len: usize,
    allowed_next: impl Fn(char) -> bool,
) -> bool {
    let prev_ok = text[..idx]
        .chars()
        .next_back()
        .is_none_or(|c| !(is_ident_char(c) || c == '-' || c == ':' || c == '.'));
    let next_ok = text[idx + len..]
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || allowed_next(c));
    prev_ok && next_ok
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[derive(Clone)]
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            return true;
        }
        false
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !keep(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.text[start..self.pos].to_string()
    }

    /// Reads up to the closing quote, keeping escapes verbatim.
    fn quoted(&mut self, quote: char) -> String {
        let mut value = String::new();
        while let Some(ch) = self.bump() {
            if ch == '\\' {
                value.push(ch);
                if let Some(next) = self.bump() {
                    value.push(next);
                }
                continue;
            }
            if ch == quote {
                break;
            }
            value.push(ch);
        }
        value
    }

    fn template(&mut self) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                '`' => break,
                '\\' => {
                    current.push(ch);
                    if let Some(next) = self.bump() {
                        current.push(next);
                    }
                }
                '$' if self.peek() == Some('{') => {
                    if !current.is_empty() {
                        chunks.push(std::mem::take(&mut current));
                    }
                    self.balanced('{', '}');
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Consumes a balanced group starting at `open` and returns its inner
    /// text. Quoted sections are skipped over.
    fn balanced(&mut self, open: char, close: char) -> &'a str {
        let text = self.text;
        if !self.eat(open) {
            return "";
        }
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            let at = self.pos;
            self.pos += ch.len_utf8();
            match ch {
                '"' | '\'' => {
                    self.quoted(ch);
                }
                '`' => {
                    self.template();
                }
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return &text[start..at];
                    }
                }
                _ => {}
            }
        }
        &text[start..]
    }
}
