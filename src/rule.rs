//! Rule data model.
//!
//! A [`Rule`] is one entry in a client's mock list: a predicate over an
//! inbound request plus an optional synthesized response. [`RuleList`] is
//! the ordered collection the matcher scans; order is significant and is
//! never reshuffled by the store.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How `path` should be compared against the inbound pathname.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    #[default]
    Literal,
    Regexp,
}

/// How `response` should be interpreted before being written out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Raw,
    Mockjs,
}

fn default_status() -> u16 {
    200
}

/// One mock entry under a client's rule list.
///
/// `regex` is a derived field: it is compiled once when the rule enters the
/// store (see [`crate::rule_store::RuleStore::put`]) rather than on every
/// match attempt. It is never serialized and is rebuilt from `path` on
/// deserialization, so `Rule` can still be cloned cheaply even though
/// `Regex` itself has no useful `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Exact host match; if absent, host is not checked.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub host: Option<String>,

    /// Literal path or regular expression, depending on `pathtype`.
    pub path: String,

    #[serde(default)]
    pub pathtype: PathType,

    /// Prefix prepended to `path` for literal comparison.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prepath: Option<String>,

    /// Required `k=v&k=v` query or form parameters.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<String>,

    /// Artificial latency applied before responding, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delay: Option<u64>,

    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub responsetype: ResponseType,

    /// Response body. Absent means "match for observation only, still forward".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response: Option<serde_json::Value>,

    /// Pre-compiled regex for `pathtype = regexp`. Rebuilt on store insert.
    #[serde(skip, default)]
    pub compiled_path: Option<Regex>,
}

impl Rule {
    /// Effective path used for literal comparison: `prepath` followed by `path`.
    pub fn effective_path(&self) -> String {
        match &self.prepath {
            Some(p) => format!("{p}{}", self.path),
            None => self.path.clone(),
        }
    }

    /// Compile the regex pattern, if this rule needs one. Returns an error
    /// naming the offending pattern so the store can reject malformed rules
    /// instead of letting them panic at match time.
    pub fn compile(&mut self) -> Result<(), String> {
        if self.pathtype == PathType::Regexp {
            let pattern = self.effective_path();
            let re = Regex::new(&pattern).map_err(|e| format!("invalid regex '{pattern}': {e}"))?;
            self.compiled_path = Some(re);
        }
        Ok(())
    }
}

/// An ordered list of rules for one client. Order is the match priority.
pub type RuleList = Vec<Rule>;
