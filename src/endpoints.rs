//! The endpoint URIs served by the app.

/// The public landing page.
pub const ROOT: &str = "/";
/// The landing page for signed in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for a single account and its transactions.
pub const ACCOUNT_VIEW: &str = "/account/{account_id}";
/// The page for recording a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transaction/create";
/// The page where users sign in with the identity provider.
pub const SIGN_IN_VIEW: &str = "/sign-in";
/// The page where new users create an account with the identity provider.
pub const SIGN_UP_VIEW: &str = "/sign-up";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for the client to sign out the current user.
pub const SIGN_OUT: &str = "/api/sign_out";
