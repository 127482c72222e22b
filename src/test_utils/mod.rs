#![allow(missing_docs)]

pub(crate) mod html;
pub(crate) mod identity_provider;

pub(crate) use html::{assert_valid_html, parse_html_document};
pub(crate) use identity_provider::{StubIdentityProvider, test_user};
