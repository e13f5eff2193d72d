//! Client view routes and the navigation guard.
//!
//! Routes are partitioned into exactly two classes: `login` is public,
//! every other route is protected. Classification is static and never
//! derived from token contents.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::store::TokenStore;

/// A named client view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login form. The only public route.
    Login,
    /// Code editor — the default (home) view.
    CodeEditor,
    /// Interactive terminal attached to a sandbox session.
    TerminalEmulator,
}

/// The route a logged-in user lands on by default.
pub const HOME: Route = Route::CodeEditor;

impl Route {
    /// All routes known to the client.
    pub const ALL: [Route; 3] = [Route::Login, Route::CodeEditor, Route::TerminalEmulator];

    /// Whether the route is reachable without a token.
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login)
    }

    /// Stable route name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::CodeEditor => "code-editor",
            Route::TerminalEmulator => "terminal-emulator",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .iter()
            .copied()
            .find(|route| route.name() == s)
            .ok_or_else(|| UnknownRoute(s.to_owned()))
    }
}

/// A route name not present in the route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(String);

/// Outcome of a navigation guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The transition proceeds unmodified.
    Proceed,
    /// The transition is replaced by a silent redirect to the given route.
    Redirect(Route),
}

/// Decide a route transition from current token presence.
///
/// Evaluated independently for every navigation event: the store is
/// re-read on each call and no history is retained. Total over
/// `{Proceed, Redirect(login), Redirect(home)}` — never errors, and
/// never mutates the store.
pub fn decide(target: Route, store: &dyn TokenStore) -> GuardDecision {
    let has_token = store.get().is_some();
    let decision = if target.is_public() && has_token {
        GuardDecision::Redirect(HOME)
    } else if !target.is_public() && !has_token {
        GuardDecision::Redirect(Route::Login)
    } else {
        GuardDecision::Proceed
    };
    debug!(route = %target, has_token, ?decision, "navigation guard evaluated");
    decision
}
