use crate::config::KnowledgeConfig;
use crate::error::AccessError;
use globset::{GlobBuilder, GlobMatcher};
use std::fmt::Write as _;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

/// One allow-list entry. `*` stays inside a path segment; `**` spans any
/// number of directories, including none.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pattern: String,
    mode: AccessMode,
    matcher: GlobMatcher,
}

fn compile(pattern: &str) -> Result<GlobMatcher, AccessError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| AccessError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

impl AccessRule {
    pub fn new(pattern: &str, mode: AccessMode) -> Result<Self, AccessError> {
        Ok(Self {
            pattern: pattern.to_string(),
            mode,
            matcher: compile(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

/// The complete, immutable rule set for one knowledge root.
#[derive(Debug, Clone)]
pub struct AccessRules {
    rules: Vec<AccessRule>,
    blocked: Vec<(String, GlobMatcher)>,
    /// Readable but never writable through the gateway (session state).
    reserved: Vec<String>,
}

impl AccessRules {
    pub fn new<S: AsRef<str>>(
        readable: &[S],
        writable: &[S],
        blocked: &[S],
    ) -> Result<Self, AccessError> {
        let mut rules = Vec::with_capacity(readable.len() + writable.len());
        for pattern in readable {
            rules.push(AccessRule::new(pattern.as_ref(), AccessMode::Read)?);
        }
        for pattern in writable {
            rules.push(AccessRule::new(pattern.as_ref(), AccessMode::Write)?);
        }
        let blocked = blocked
            .iter()
            .map(|p| compile(p.as_ref()).map(|m| (p.as_ref().to_string(), m)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            blocked,
            reserved: Vec::new(),
        })
    }

    /// Deny writes to `path` regardless of the write rules.
    pub fn with_reserved(mut self, path: impl Into<String>) -> Self {
        self.reserved.push(path.into());
        self
    }

    /// Config rules, with the session state file reserved.
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, AccessError> {
        Ok(Self::new(&config.readable, &config.writable, &config.blocked)?
            .with_reserved(config.state_path.trim().trim_start_matches('/')))
    }

    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved.iter().any(|r| r == path)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn is_blocked(&self, path: &str) -> bool {
        self.blocked.iter().any(|(_, m)| m.is_match(path))
    }

    /// Only rules of the requested mode count; a read rule never grants write.
    pub fn permits(&self, path: &str, mode: AccessMode) -> bool {
        !self.is_blocked(path)
            && !(mode == AccessMode::Write && self.is_reserved(path))
            && self
                .rules
                .iter()
                .any(|rule| rule.mode == mode && rule.matches(path))
    }

    pub fn check(&self, path: &str, mode: AccessMode) -> Result<(), AccessError> {
        if self.is_blocked(path) {
            return Err(AccessError::Blocked(path.to_string()));
        }
        if mode == AccessMode::Write && self.is_reserved(path) {
            return Err(AccessError::Reserved(path.to_string()));
        }
        if self.permits(path, mode) {
            Ok(())
        } else {
            Err(AccessError::Denied {
                path: path.to_string(),
                mode: mode.into(),
            })
        }
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("readable:\n");
        for rule in self.rules.iter().filter(|r| r.mode == AccessMode::Read) {
            let _ = writeln!(out, "  {}", rule.pattern);
        }
        out.push_str("writable:\n");
        for rule in self.rules.iter().filter(|r| r.mode == AccessMode::Write) {
            let _ = writeln!(out, "  {}", rule.pattern);
        }
        out.push_str("blocked:\n");
        for (pattern, _) in &self.blocked {
            let _ = writeln!(out, "  {pattern}");
        }
        if !self.reserved.is_empty() {
            out.push_str("read-only (managed by spark):\n");
            for path in &self.reserved {
                let _ = writeln!(out, "  {path}");
            }
        }
        out
    }
}
