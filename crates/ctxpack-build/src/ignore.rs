//! `.dockerignore` patterns.
//!
//! Patterns are evaluated in order and the last match wins; a leading `!`
//! re-includes what earlier patterns excluded. A pattern also matches a
//! path whose ancestor directory (at the pattern's depth) matches, so
//! `build` excludes everything under `build/`.

use std::path::Path;

use regex::Regex;

use crate::paths;

/// Name of the ignore file at the workspace root.
pub const IGNORE_FILE: &str = ".dockerignore";

/// Compiled ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
    /// Number of `/`-separated segments in the pattern.
    depth: usize,
    exclusion: bool,
}

impl PatternSet {
    /// Read `.dockerignore` from `workspace`. A missing file is an empty set.
    pub fn load(workspace: &Path) -> Result<Self, PatternError> {
        let path = workspace.join(IGNORE_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(PatternError::Read { path, source: e }),
        };
        Self::parse(&content)
    }

    /// Parse ignore-file content: one pattern per line, `#` comments.
    pub fn parse(content: &str) -> Result<Self, PatternError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let lines: Vec<String> = content
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(normalize_line)
            .collect();
        Self::new(&lines)
    }

    /// Compile already-normalized patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }

            let (exclusion, body) = match raw.strip_prefix('!') {
                Some(rest) if rest.trim().is_empty() => {
                    return Err(PatternError::IllegalExclusion);
                }
                Some(rest) => (true, rest.trim()),
                None => (false, raw),
            };

            let cleaned = paths::clean_str(body);
            if cleaned == "." {
                continue;
            }

            let regex = Regex::new(&to_regex(&cleaned)?).map_err(|e| PatternError::Invalid {
                pattern: raw.to_owned(),
                detail: e.to_string(),
            })?;
            compiled.push(Pattern {
                depth: cleaned.split('/').count(),
                source: cleaned,
                regex,
                exclusion,
            });
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether the workspace-relative path `file` is excluded.
    pub fn matches(&self, file: &str) -> bool {
        let file = paths::clean_str(file);
        let parent_dirs: Vec<&str> = match file.rsplit_once('/') {
            Some((parent, _)) => parent.split('/').collect(),
            None => Vec::new(),
        };

        let mut matched = false;
        for pattern in &self.patterns {
            let mut hit = pattern.regex.is_match(&file);
            if !hit && !parent_dirs.is_empty() && pattern.depth <= parent_dirs.len() {
                hit = pattern
                    .regex
                    .is_match(&parent_dirs[..pattern.depth].join("/"));
            }
            if hit {
                matched = !pattern.exclusion;
            }
        }
        matched
    }

    /// Pattern sources in evaluation order, `!` marking exclusions.
    pub fn patterns(&self) -> impl Iterator<Item = String> + '_ {
        self.patterns.iter().map(|p| {
            if p.exclusion {
                format!("!{}", p.source)
            } else {
                p.source.clone()
            }
        })
    }
}

/// Clean a pattern line, keep its `!`, and drop a leading `/`.
fn normalize_line(line: &str) -> String {
    let (invert, body) = match line.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, line),
    };
    let mut body = if body.is_empty() {
        String::new()
    } else {
        let cleaned = paths::clean(Path::new(body));
        let mut cleaned = paths::to_slash(&cleaned);
        if body.starts_with('/') && cleaned.is_empty() {
            cleaned.push('/');
        }
        cleaned
    };
    if body.len() > 1 && body.starts_with('/') {
        body.remove(0);
    }
    if invert { format!("!{body}") } else { body }
}

/// Translate a cleaned pattern into an anchored regex.
fn to_regex(pattern: &str) -> Result<String, PatternError> {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                chars.next_if_eq(&'/');
                if chars.peek().is_none() {
                    re.push_str(".*");
                } else {
                    re.push_str("(.*/)?");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '\\' => match chars.next() {
                Some(next) => re.push_str(&regex::escape(&next.to_string())),
                None => re.push_str(r"\\"),
            },
            '[' => {
                re.push('[');
                if chars.next_if(|&c| c == '!' || c == '^').is_some() {
                    re.push('^');
                }
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let escaped = chars.next().ok_or_else(|| bad_pattern(pattern))?;
                            re.push_str(&regex::escape(&escaped.to_string()));
                        }
                        '[' => re.push_str(r"\["),
                        c => re.push(c),
                    }
                }
                if !closed {
                    return Err(bad_pattern(pattern));
                }
                re.push(']');
            }
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }

    re.push('$');
    Ok(re)
}

fn bad_pattern(pattern: &str) -> PatternError {
    PatternError::Invalid {
        pattern: pattern.to_owned(),
        detail: "syntax error in pattern".to_owned(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to read ignore file {path}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("illegal exclusion pattern: \"!\"")]
    IllegalExclusion,
    #[error("invalid ignore pattern {pattern:?}: {detail}")]
    Invalid { pattern: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_prefix_matches_any_depth_including_root() {
        let set = PatternSet::parse("**/ignored.txt").unwrap();
        assert!(set.matches("ignored.txt"));
        assert!(set.matches("files/ignored.txt"));
        assert!(set.matches("a/b/ignored.txt"));
        assert!(!set.matches("files/included.txt"));
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        let set = PatternSet::parse("*.log").unwrap();
        assert!(set.matches("debug.log"));
        assert!(!set.matches("logs/debug.log"));
    }

    #[test]
    fn directory_pattern_covers_descendants() {
        let set = PatternSet::parse("target").unwrap();
        assert!(set.matches("target"));
        assert!(set.matches("target/debug/app"));
        assert!(!set.matches("src/target"));
    }

    #[test]
    fn last_match_wins_with_exceptions() {
        let set = PatternSet::parse("*.md\n!README.md\n").unwrap();
        assert!(set.matches("CHANGELOG.md"));
        assert!(!set.matches("README.md"));

        let set = PatternSet::parse("!README.md\n*.md\n").unwrap();
        assert!(set.matches("README.md"));
    }

    #[test]
    fn comments_blank_lines_and_leading_slash() {
        let set = PatternSet::parse("# comment\n\n  /secret.txt  \n./tmp/\n").unwrap();
        let patterns: Vec<String> = set.patterns().collect();
        assert_eq!(patterns, vec!["secret.txt", "tmp"]);
        assert!(set.matches("secret.txt"));
        assert!(set.matches("tmp/x"));
    }

    #[test]
    fn question_mark_and_classes() {
        let set = PatternSet::parse("file?.txt\ndata[0-9].csv\nlog[!a].txt").unwrap();
        assert!(set.matches("file1.txt"));
        assert!(!set.matches("file10.txt"));
        assert!(set.matches("data7.csv"));
        assert!(!set.matches("datax.csv"));
        assert!(set.matches("logb.txt"));
        assert!(!set.matches("loga.txt"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let set = PatternSet::parse("a+b(1).txt").unwrap();
        assert!(set.matches("a+b(1).txt"));
        assert!(!set.matches("aab1.txt"));
    }

    #[test]
    fn lone_exclamation_is_rejected() {
        assert!(matches!(
            PatternSet::parse("!\n"),
            Err(PatternError::IllegalExclusion)
        ));
    }

    #[test]
    fn unclosed_class_is_rejected() {
        assert!(matches!(
            PatternSet::parse("data[0-9"),
            Err(PatternError::Invalid { .. })
        ));
    }

    #[test]
    fn dot_pattern_is_dropped() {
        let set = PatternSet::parse(".\n./\n").unwrap();
        assert!(set.is_empty());
    }
}
