/// Router Module Index
///
/// Routes are grouped by access level so the authentication layer is applied per group,
/// never per handler.

/// Anonymous, read-only catalog access and health checks.
pub mod public;

/// State-changing catalog routes. Wrapped in the confirmed-session layer.
pub mod authenticated;

/// Server-rendered admin pages. The session guard runs inside each page and redirects
/// instead of rejecting.
pub mod dashboard;
