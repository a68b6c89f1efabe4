//! Gate middleware for protected routes.

use axum::{
    extract::{Request, State},
    handler::Handler,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, MethodRouter},
};
use std::sync::Arc;
use tracing::debug;

use super::{views, SiteState};
use crate::gate::{evaluate, Decision, ProtectedRoute};

/// Per-route middleware state.
#[derive(Clone)]
pub struct RouteGate {
    site: Arc<SiteState>,
    route: ProtectedRoute,
}

/// Bind `handler` to GET behind the gate declared by `route`.
pub fn protect<H, T>(route: ProtectedRoute, handler: H, site: &Arc<SiteState>) -> MethodRouter
where
    H: Handler<T, ()>,
    T: 'static,
{
    let gate = RouteGate {
        site: Arc::clone(site),
        route,
    };
    get(handler).route_layer(middleware::from_fn_with_state(gate, guard))
}

async fn guard(State(gate): State<RouteGate>, mut request: Request, next: Next) -> Response {
    let snapshot = gate.site.snapshot(request.headers()).await;
    let decision = evaluate(&snapshot, &gate.route);

    debug!(
        route = gate.route.path,
        decision = decision.as_str(),
        "gate decision"
    );

    match decision {
        Decision::Loading => {
            let target = request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path(), |pq| pq.as_str());
            views::loading(target)
        }
        Decision::Unauthenticated { redirect_to } | Decision::Unauthorized { redirect_to } => {
            Redirect::to(redirect_to).into_response()
        }
        Decision::Unverified => match snapshot.user.as_ref() {
            Some(user) => views::verification_notice(user, gate.site.config().turnstile_site_key()),
            None => Redirect::to(crate::gate::SIGN_IN_PATH).into_response(),
        },
        Decision::Granted => {
            if let Some(user) = snapshot.user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
    }
}
