//! Public pages and the views behind the gate.
//!
//! Guarded views read the [`SessionUser`] the gate attached to the request.

use axum::{
    extract::{Extension, Path},
    response::Html,
};
use std::sync::Arc;

use crate::site::{packages, views, SiteState};
use crate::gate::SessionUser;

pub async fn home(site: Extension<Arc<SiteState>>) -> Html<String> {
    views::home(site.config().cdn_base_url(), packages::PACKAGES)
}

pub async fn sign_in() -> Html<String> {
    views::sign_in()
}

pub async fn dashboard(Extension(user): Extension<SessionUser>) -> Html<String> {
    views::dashboard(&user)
}

pub async fn admin(Extension(user): Extension<SessionUser>) -> Html<String> {
    views::admin(&user)
}

pub async fn checkout(Path(package_id): Path<String>) -> Html<String> {
    views::checkout(&package_id, packages::find(&package_id))
}
