// @awa-component: ACC-AccessPolicy
//
//! Route gating.
//!
//! [`decide`] is a pure function of its inputs. Performing the navigation is
//! the job of the [`observer::SessionObserver`], which is the only place that
//! turns decisions into effects.

pub mod observer;

use std::fmt;

use serde::Serialize;

/// Routes that require an active subscription. Nested paths are gated too.
pub const GATED_ROUTES: [&str; 4] = ["/", "/library", "/favorites", "/history"];

/// Where the member is sent when they may not see a gated route.
pub const PROFILE_ROUTE: &str = "/profile";

/// Where unauthenticated visitors are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Gating outcome for a resolved session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectProfile,
}

impl Decision {
    /// Navigation target, if the decision is a redirect.
    pub fn target(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectLogin => Some(LOGIN_ROUTE),
            Self::RedirectProfile => Some(PROFILE_ROUTE),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            None => f.write_str("allow"),
            Some(target) => write!(f, "redirect:{target}"),
        }
    }
}

/// Strip query string and fragment.
fn path_of(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    &route[..end]
}

/// Whether `route` is one of [`GATED_ROUTES`] or nested beneath one.
pub fn is_gated(route: &str) -> bool {
    let path = path_of(route);
    GATED_ROUTES.iter().any(|gated| {
        path == *gated
            || path
                .strip_prefix(gated)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Decide whether `route` may be rendered.
///
/// Returns `None` while authentication is still loading: the caller must
/// suspend rendering and no redirect may fire on that state.
pub fn decide(
    route: &str,
    is_authenticated: bool,
    is_loading: bool,
    has_active_subscription: bool,
) -> Option<Decision> {
    if is_loading {
        return None;
    }
    if !is_authenticated {
        return Some(Decision::RedirectLogin);
    }
    if is_gated(route) && !has_active_subscription {
        return Some(Decision::RedirectProfile);
    }
    Some(Decision::Allow)
}
