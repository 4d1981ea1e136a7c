//! Rule matcher (component B).
//!
//! First-match-wins scan over host, path and params predicates. No implicit
//! anchoring of regex patterns and no specificity scoring: the order the
//! rules were stored in is the only priority signal.

use crate::inbound::InboundRequest;
use crate::rule::{PathType, Rule};

/// Return the first rule in `rules` that matches `inbound`, if any.
pub fn match_rule<'a>(rules: &'a [Rule], inbound: &InboundRequest) -> Option<&'a Rule> {
    rules.iter().find(|rule| matches(rule, inbound))
}

fn matches(rule: &Rule, inbound: &InboundRequest) -> bool {
    host_matches(rule, inbound) && path_matches(rule, inbound) && params_match(rule, inbound)
}

fn host_matches(rule: &Rule, inbound: &InboundRequest) -> bool {
    match &rule.host {
        Some(host) => host.eq_ignore_ascii_case(&inbound.host),
        None => true,
    }
}

fn path_matches(rule: &Rule, inbound: &InboundRequest) -> bool {
    match rule.pathtype {
        PathType::Literal => rule.effective_path() == inbound.pathname,
        PathType::Regexp => rule
            .compiled_path
            .as_ref()
            .map(|re| re.is_match(&inbound.pathname))
            .unwrap_or(false),
    }
}

fn params_match(rule: &Rule, inbound: &InboundRequest) -> bool {
    let Some(raw) = &rule.params else {
        return true;
    };
    let form_body = if inbound.method.eq_ignore_ascii_case("POST") {
        Some(InboundRequest::decode_form_body(&inbound.body))
    } else {
        None
    };

    for pair in raw.split('&') {
        let Some((k, v)) = pair.split_once('=') else {
            continue;
        };
        let satisfied = inbound.query.get(k).map(|s| s.as_str()) == Some(v)
            || form_body
                .as_ref()
                .and_then(|m| m.get(k))
                .map(|s| s.as_str())
                == Some(v);
        if !satisfied {
            return false;
        }
    }
    true
}
