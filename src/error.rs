use std::fmt;

/// Registration-time failures. These surface during router construction,
/// before any traffic is served; request-time outcomes (404, 405) are HTTP
/// responses, not errors.
#[derive(Debug)]
pub enum RouterError {
    /// Method outside the allowed set (GET, POST, PUT, PATCH, DELETE, OPTIONS).
    InvalidMethod(String),
    /// Route path that does not begin with `/`.
    InvalidPath(String),
    /// Resource name registered twice on the same router.
    DuplicateResource(String),
    /// Two different parameter names at the same trie level.
    WildcardConflict { existing: String, conflicting: String },
    /// A wildcard segment directly inside another wildcard segment.
    NestedWildcard(String),
    /// Parameter name not matching `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidParamName(String),
    /// The same parameter name bound twice in one path.
    DuplicateParamName(String),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidMethod(m) => write!(f, "invalid HTTP method: {}", m),
            RouterError::InvalidPath(p) => write!(f, "route path must begin with '/': {}", p),
            RouterError::DuplicateResource(n) => write!(f, "resource already registered: {}", n),
            RouterError::WildcardConflict {
                existing,
                conflicting,
            } => write!(
                f,
                "wildcard ':{}' conflicts with existing ':{}' at the same level",
                conflicting, existing
            ),
            RouterError::NestedWildcard(p) => {
                write!(f, "wildcard segment nested directly in a wildcard: {}", p)
            }
            RouterError::InvalidParamName(n) => write!(f, "invalid parameter name: '{}'", n),
            RouterError::DuplicateParamName(n) => {
                write!(f, "parameter name bound twice in one path: '{}'", n)
            }
        }
    }
}

impl std::error::Error for RouterError {}
