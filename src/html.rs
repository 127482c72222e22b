//! Shared page layout and small markup helpers.

use maud::{DOCTYPE, Markup, html};

use crate::endpoints;

pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

pub const BUTTON_PRIMARY_STYLE: &str = "px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 hover:bg-blue-600 hover:dark:bg-blue-700 text-white rounded";

pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// Wrap `content` in the full HTML document shared by every page.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - PesaTrack" }
                link href="/static/main.css" rel="stylesheet";
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

/// The navigation bar, which differs for signed in users.
pub fn nav_bar(signed_in: bool) -> Markup {
    html! {
        nav class="flex items-center justify-between px-4 py-4 border-b"
        {
            a href=(endpoints::ROOT) class="text-2xl font-semibold" { "PesaTrack" }

            div class="flex items-center space-x-4"
            {
                @if signed_in {
                    (link(endpoints::DASHBOARD_VIEW, "Dashboard"))
                    (link(endpoints::NEW_TRANSACTION_VIEW, "Add Transaction"))
                    (link(endpoints::SIGN_OUT, "Sign Out"))
                } @else {
                    (link(endpoints::SIGN_IN_VIEW, "Login"))
                }
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-sm text-center lg:py-16"
            {
                h1 class="mb-4 text-7xl tracking-tight font-extrabold text-blue-600"
                {
                    (header)
                }

                p class="mb-4 text-3xl tracking-tight font-bold" { (description) }

                p class="mb-4 text-2xl tracking-tight" { (fix) }

                a href=(endpoints::ROOT) class=(BUTTON_PRIMARY_STYLE) { "Back to Homepage" }
            }
        }
    );

    base(title, &content)
}

pub fn link(url: &str, text: &str) -> Markup {
    html! {
        a href=(url) class=(LINK_STYLE) { (text) }
    }
}
