//! Route access gate.
//!
//! Flow Overview: every request to a protected route is reduced to a
//! [`SessionSnapshot`] plus the route's [`ProtectedRoute`] declaration, and
//! [`evaluate`] walks [`RULES`] in order. The first rule that matches decides;
//! when none match, access is granted. The gate never awaits, never mutates the
//! snapshot, and is re-evaluated on every request.
//!
//! Admins are exempt from the email verification rule.

use serde::{Deserialize, Deserializer, Serialize};

/// Where unauthenticated callers are sent.
pub const SIGN_IN_PATH: &str = "/auth";
/// Default landing page for authenticated callers.
pub const LANDING_PATH: &str = "/dashboard";

/// Account role as reported by the auth API.
///
/// Unknown role strings decode to [`Role::Member`] so they never satisfy an
/// admin check.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Member,
}

impl Role {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        match self {
            Self::Admin => true,
            Self::Member => false,
        }
    }
}

/// Authenticated user attributes consumed by the gate and the views.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
}

/// Absent and `null` fields both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read-only view of the caller's session at request time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionSnapshot {
    pub is_loading: bool,
    pub user: Option<SessionUser>,
}

impl SessionSnapshot {
    /// Session resolution is still in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            is_loading: true,
            user: None,
        }
    }

    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            is_loading: false,
            user: None,
        }
    }

    #[must_use]
    pub const fn authenticated(user: SessionUser) -> Self {
        Self {
            is_loading: false,
            user: Some(user),
        }
    }

    /// Settled snapshot for an optional user.
    #[must_use]
    pub fn resolved(user: Option<SessionUser>) -> Self {
        user.map_or_else(Self::anonymous, Self::authenticated)
    }
}

/// Access declaration attached to a route at registration time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProtectedRoute {
    pub path: &'static str,
    pub require_admin: bool,
}

impl ProtectedRoute {
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            require_admin: false,
        }
    }

    #[must_use]
    pub const fn admin_only(mut self) -> Self {
        self.require_admin = true;
        self
    }
}

/// Outcome of a single gate evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Session still resolving; render a placeholder and poll again.
    Loading,
    /// No session; redirect to sign-in.
    Unauthenticated { redirect_to: &'static str },
    /// Email not verified; render the verification notice instead of the view.
    Unverified,
    /// Authenticated but lacking the admin role; redirect silently.
    Unauthorized { redirect_to: &'static str },
    /// Render the requested view with its original parameters.
    Granted,
}

impl Decision {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Unverified => "unverified",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Granted => "granted",
        }
    }
}

type Rule = fn(&SessionSnapshot, &ProtectedRoute) -> Option<Decision>;

/// Gate rules in precedence order.
pub const RULES: [Rule; 4] = [
    session_loading,
    session_missing,
    email_unverified,
    admin_required,
];

/// Decide how to answer a request for `route` given the current session.
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, route: &ProtectedRoute) -> Decision {
    RULES
        .iter()
        .find_map(|rule| rule(snapshot, route))
        .unwrap_or(Decision::Granted)
}

fn session_loading(snapshot: &SessionSnapshot, _route: &ProtectedRoute) -> Option<Decision> {
    snapshot.is_loading.then_some(Decision::Loading)
}

fn session_missing(snapshot: &SessionSnapshot, _route: &ProtectedRoute) -> Option<Decision> {
    snapshot.user.is_none().then_some(Decision::Unauthenticated {
        redirect_to: SIGN_IN_PATH,
    })
}

fn email_unverified(snapshot: &SessionSnapshot, _route: &ProtectedRoute) -> Option<Decision> {
    let user = snapshot.user.as_ref()?;
    (!user.email_verified && !user.role.is_admin()).then_some(Decision::Unverified)
}

fn admin_required(snapshot: &SessionSnapshot, route: &ProtectedRoute) -> Option<Decision> {
    let user = snapshot.user.as_ref()?;
    (route.require_admin && !user.role.is_admin()).then_some(Decision::Unauthorized {
        redirect_to: LANDING_PATH,
    })
}
