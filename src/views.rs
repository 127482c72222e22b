//! Placeholder pages for the host app.
//!
//! Account, transaction and budget features live elsewhere; these pages only
//! give the access gate something real to guard.

use axum::{
    Extension,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, error_view, link, nav_bar},
    session::SessionUser,
};

fn display_name(user: &SessionUser) -> &str {
    user.email.as_deref().unwrap_or(&user.id)
}

/// The public landing page.
pub async fn get_landing_page() -> Markup {
    let content = html! {
        (nav_bar(false))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-4xl font-bold" { "Manage your finances with intelligence" }
            p { "Track accounts and transactions, set budgets and get spending insights." }
            (link(endpoints::SIGN_UP_VIEW, "Get Started"))
        }
    };

    base("Home", &content)
}

/// The landing page for signed in users.
pub async fn get_dashboard_page(Extension(user): Extension<SessionUser>) -> Markup {
    let content = html! {
        (nav_bar(true))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold" { "Dashboard" }
            p id="signed-in-as" { "Signed in as " (display_name(&user)) }
        }
    };

    base("Dashboard", &content)
}

/// The page for a single account.
pub async fn get_account_page(
    Path(account_id): Path<String>,
    Extension(user): Extension<SessionUser>,
) -> Markup {
    let content = html! {
        (nav_bar(true))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 id="account-id" class="text-3xl font-bold" { "Account " (account_id) }
            p { "Signed in as " (display_name(&user)) }
        }
    };

    base("Account", &content)
}

/// The page for recording a new transaction.
pub async fn get_new_transaction_page(Extension(user): Extension<SessionUser>) -> Markup {
    let content = html! {
        (nav_bar(true))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold" { "Add Transaction" }
            p { "Signed in as " (display_name(&user)) }
        }
    };

    base("Add Transaction", &content)
}

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    redirect: Option<String>,
}

/// The sign-in page.
///
/// Signing in happens with the identity provider's client-side widget, so the
/// page has no form of its own to submit. It only carries the `redirect`
/// parameter along so the provider's callback can return the user to where
/// they started.
pub async fn get_sign_in_page(Query(query): Query<SignInQuery>) -> Markup {
    let content = html! {
        (nav_bar(false))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold" { "Sign in to PesaTrack" }

            section id="sign-in-form"
            {
                @if let Some(redirect) = &query.redirect {
                    input type="hidden" name="redirect" value=(redirect);
                }
            }

            p { "Don't have an account? " (link(endpoints::SIGN_UP_VIEW, "Sign up")) }
        }
    };

    base("Sign In", &content)
}

/// The sign-up page.
pub async fn get_sign_up_page() -> Markup {
    let content = html! {
        (nav_bar(false))
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold" { "Create your PesaTrack account" }
            p { "Already have an account? " (link(endpoints::SIGN_IN_VIEW, "Sign in")) }
        }
    };

    base("Sign Up", &content)
}

pub async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Something's missing.",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        ),
    )
        .into_response()
}
