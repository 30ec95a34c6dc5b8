//! [`Expander`]: keyword substitution over message templates.

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::error::TemplateError;
use crate::hostname::{HostnameResolver, SystemHostname};

const KEYWORD_PATTERN: &str = r"(?i)\$(?:\{(hostname|detailed_information|brief_information|stdout)\}|(hostname|detailed_information|brief_information|stdout)\b)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Hostname,
    Detailed,
    Brief,
    Stdout,
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "hostname" => Some(Keyword::Hostname),
            "detailed_information" => Some(Keyword::Detailed),
            "brief_information" => Some(Keyword::Brief),
            "stdout" => Some(Keyword::Stdout),
            _ => None,
        }
    }
}

/// Rewrites keyword tokens in templates. Cheap to clone.
#[derive(Clone)]
pub struct Expander {
    pattern: Regex,
    resolver: Arc<dyn HostnameResolver>,
}

impl fmt::Debug for Expander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expander")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

impl Expander {
    /// An expander resolving `$HOSTNAME` through `hostname -f`.
    pub fn new() -> Result<Self, TemplateError> {
        Self::with_resolver(SystemHostname)
    }

    pub fn with_resolver(resolver: impl HostnameResolver + 'static) -> Result<Self, TemplateError> {
        Ok(Self {
            pattern: Regex::new(KEYWORD_PATTERN)?,
            resolver: Arc::new(resolver),
        })
    }

    /// Expand every keyword token in `template`.
    ///
    /// `detailed` is first expanded with `brief` and `stdout`; `brief` is
    /// expanded with the host name only. Tokens that are not keywords, and
    /// `$STDOUT` when `stdout` is empty, are left as written.
    pub fn expand(&self, template: &str, detailed: &str, brief: &str, stdout: &str) -> String {
        let detailed = if detailed.is_empty() {
            String::new()
        } else {
            self.expand(detailed, "", brief, stdout)
        };
        let brief = if brief.is_empty() {
            String::new()
        } else {
            self.expand(brief, "", "", "")
        };
        self.substitute(template, &detailed, &brief, stdout)
    }

    fn substitute(&self, template: &str, detailed: &str, brief: &str, stdout: &str) -> String {
        // Looked up at most once per call, and only if the token is present.
        let mut hostname: Option<String> = None;
        self.pattern
            .replace_all(template, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                let raw = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                match Keyword::parse(raw) {
                    Some(Keyword::Hostname) => hostname
                        .get_or_insert_with(|| self.resolver.hostname())
                        .clone(),
                    Some(Keyword::Detailed) => detailed.to_string(),
                    Some(Keyword::Brief) => brief.to_string(),
                    Some(Keyword::Stdout) if !stdout.is_empty() => stdout.to_string(),
                    Some(Keyword::Stdout) | None => whole.to_string(),
                }
            })
            .into_owned()
    }
}
