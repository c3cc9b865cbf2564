/// Paths reachable without any session. Matched exactly, never as patterns.
pub const PUBLIC_ROUTES: [&str; 3] = ["/sign-in", "/sign-up", "/pending-approval"];

/// is_public_route
///
/// Public routes bypass authorization entirely. They must be checked before the
/// "no role → sign-in" rule, otherwise an anonymous visit to sign-in would redirect to itself.
pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}
