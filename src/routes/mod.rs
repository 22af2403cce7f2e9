/// Router Module Index
///
/// Routes are split by access level. Each level gets its guard as a route
/// layer in `create_router`, so a handler cannot end up exposed by accident.

/// Anonymous routes: the public blog, auth entry points and diagnostics.
pub mod public;

/// Routes behind `auth_middleware` (any signed-in user).
pub mod authenticated;

/// Routes behind `admin_middleware`, nested under `/api/admin`.
pub mod admin;
