/// Router Module Index
///
/// Splits the routing table by access level so that authentication is applied
/// once, as a layer on the whole authenticated router.

/// Routes accessible to anonymous clients (health check).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware, nested under `/api`.
pub mod authenticated;
