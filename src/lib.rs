#![forbid(unsafe_code)]
#![doc = r#"
A per-client HTTP interception and mocking proxy.

Developers register an ordered list of mock rules under a client id; a
single rewrite endpoint (`/api/rewrite`) receives tunneled HTTP requests,
matches them against that client's rules, and either synthesizes a response
or forwards upstream and relays the real one. Every decided exchange is
published as a start/end event pair to whatever transport is wired to the
`Publisher` trait.

Modules
- `rule`: the `Rule`/`RuleList` data model.
- `rule_store`: in-memory per-client rule storage.
- `matcher`: first-match-wins rule selection.
- `mockjs`: template directive expansion for synthesized bodies.
- `synth`: response synthesis, including JSONP wrapping and delay.
- `forwarder`: upstream HTTP forwarding.
- `inbound`: the parsed view of one `/api/rewrite` call.
- `event` / `publisher`: the realtime event contract and its in-process adapter.
- `cors`: CORS echo and the preflight layer.
- `handler`: the `/api/rewrite` endpoint and its protocol state machine.
- `state`: shared application state.
- `config`: CLI/environment configuration.
- `error`: the error taxonomy shared by the handler and its collaborators.
- `util`: tracing setup.
"#]

pub mod config;
pub mod cors;
pub mod error;
pub mod event;
pub mod forwarder;
pub mod handler;
pub mod inbound;
pub mod matcher;
pub mod mockjs;
pub mod publisher;
pub mod rule;
pub mod rule_store;
pub mod state;
pub mod synth;
pub mod util;

pub use crate::error::RewriteError;
pub use crate::event::{Event, Topic};
pub use crate::handler::config_routes;
pub use crate::rule::{PathType, ResponseType, Rule, RuleList};
pub use crate::rule_store::RuleStore;
pub use crate::state::AppState;
