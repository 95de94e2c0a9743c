// Route authorization policy
//
// A static table of (method, path pattern, rule). The most specific matching
// entry decides; unmatched routes require an authenticated identity.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{error::AuthError, middleware::Principal, models::Role};

/// Predicate a route requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// No identity needed
    Public,
    /// Any authenticated identity
    Authenticated,
    /// Authenticated identity whose role claims contain the role
    HasRole(Role),
}

impl AccessRule {
    /// Evaluate the rule against the identity bound by the gate
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AuthError> {
        match (self, principal) {
            (AccessRule::Public, _) => Ok(()),
            (_, None) => Err(AuthError::Unauthenticated),
            (AccessRule::Authenticated, Some(_)) => Ok(()),
            (AccessRule::HasRole(role), Some(principal)) => {
                if principal.has_role(*role) {
                    Ok(())
                } else {
                    Err(AuthError::InsufficientRole)
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("pattern must start with '/': {0}")]
    NotAbsolute(String),

    #[error("'**' is only allowed as the last segment: {0}")]
    MisplacedDoubleStar(String),

    #[error("invalid pattern {0}: {1}")]
    Regex(String, regex::Error),
}

/// Specificity ordering key: literal segments, then absence of `**`,
/// then whether the entry is bound to a method.
type Specificity = (usize, bool, bool);

#[derive(Debug, Clone)]
struct PolicyEntry {
    method: Option<Method>,
    pattern: String,
    matcher: Regex,
    rule: AccessRule,
    literals: usize,
    open_ended: bool,
}

impl PolicyEntry {
    fn new(method: Option<Method>, pattern: &str, rule: AccessRule) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        }

        let segments: Vec<&str> = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut expr = String::from("^");
        let mut literals = 0;
        let mut open_ended = false;

        for (index, segment) in segments.iter().enumerate() {
            match *segment {
                "**" => {
                    if index != segments.len() - 1 {
                        return Err(PatternError::MisplacedDoubleStar(pattern.to_string()));
                    }
                    expr.push_str("(?:/.*)?");
                    open_ended = true;
                }
                "*" => expr.push_str("/[^/]+"),
                literal => {
                    expr.push('/');
                    expr.push_str(&regex::escape(literal));
                    literals += 1;
                }
            }
        }

        if segments.is_empty() {
            expr.push('/');
        }
        expr.push('$');

        let matcher =
            Regex::new(&expr).map_err(|e| PatternError::Regex(pattern.to_string(), e))?;

        Ok(Self {
            method,
            pattern: pattern.to_string(),
            matcher,
            rule,
            literals,
            open_ended,
        })
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        // HEAD is served by GET handlers, so it follows GET rules
        let method = if *method == Method::HEAD { &Method::GET } else { method };
        self.method.as_ref().map_or(true, |m| m == method) && self.matcher.is_match(path)
    }

    fn specificity(&self) -> Specificity {
        (self.literals, !self.open_ended, self.method.is_some())
    }
}

/// Route table evaluated after the authentication gate
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    entries: Vec<PolicyEntry>,
    default_rule: AccessRule,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationPolicy {
    /// Empty policy: every route requires authentication
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            default_rule: AccessRule::Authenticated,
        }
    }

    /// Add a rule for any method
    pub fn rule(self, pattern: &str, rule: AccessRule) -> Result<Self, PatternError> {
        self.push(None, pattern, rule)
    }

    /// Add a rule bound to a single method
    pub fn method_rule(
        self,
        method: Method,
        pattern: &str,
        rule: AccessRule,
    ) -> Result<Self, PatternError> {
        self.push(Some(method), pattern, rule)
    }

    /// Mark a route as public
    pub fn public(self, pattern: &str) -> Result<Self, PatternError> {
        self.rule(pattern, AccessRule::Public)
    }

    fn push(
        mut self,
        method: Option<Method>,
        pattern: &str,
        rule: AccessRule,
    ) -> Result<Self, PatternError> {
        self.entries.push(PolicyEntry::new(method, pattern, rule)?);
        Ok(self)
    }

    /// Rule for a request; most specific match wins, earliest on ties
    pub fn rule_for(&self, method: &Method, path: &str) -> AccessRule {
        let path = normalize(path);
        let mut best: Option<&PolicyEntry> = None;

        for entry in self.entries.iter().filter(|e| e.matches(method, path)) {
            match best {
                Some(current) if current.specificity() >= entry.specificity() => {}
                _ => best = Some(entry),
            }
        }

        match best {
            Some(entry) => {
                debug!("{} {} matched '{}' -> {:?}", method, path, entry.pattern, entry.rule);
                entry.rule
            }
            None => self.default_rule,
        }
    }

    pub fn check(
        &self,
        method: &Method,
        path: &str,
        principal: Option<&Principal>,
    ) -> Result<(), AuthError> {
        self.rule_for(method, path).check(principal)
    }

    /// Route table for this application
    pub fn for_application() -> Result<Self, PatternError> {
        Self::new()
            .public("/api/auth/**")?
            .method_rule(Method::GET, "/api/auth/me", AccessRule::Authenticated)?
            .public("/swagger-ui/**")?
            .public("/api-docs/**")?
            .rule("/api/users/*", AccessRule::Authenticated)?
            .method_rule(Method::GET, "/api/teams/**", AccessRule::Authenticated)?
            .rule("/api/teams/**", AccessRule::HasRole(Role::Admin))?
            .method_rule(Method::GET, "/api/players/**", AccessRule::Authenticated)?
            .rule("/api/players/**", AccessRule::HasRole(Role::Admin))
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Middleware entry point for the authorization policy
pub async fn authorize(
    State(policy): State<Arc<AuthorizationPolicy>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = request.extensions().get::<Principal>();
    policy.check(request.method(), request.uri().path(), principal)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn principal(roles: &[&str]) -> Principal {
        Principal {
            username: "alice".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn app_policy() -> AuthorizationPolicy {
        AuthorizationPolicy::for_application().unwrap()
    }

    #[test]
    fn test_rule_checks() {
        let user = principal(&["USER"]);
        let admin = principal(&["ADMIN"]);

        assert!(AccessRule::Public.check(None).is_ok());
        assert!(matches!(
            AccessRule::Authenticated.check(None),
            Err(AuthError::Unauthenticated)
        ));
        assert!(AccessRule::Authenticated.check(Some(&user)).is_ok());
        assert!(matches!(
            AccessRule::HasRole(Role::Admin).check(None),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            AccessRule::HasRole(Role::Admin).check(Some(&user)),
            Err(AuthError::InsufficientRole)
        ));
        assert!(AccessRule::HasRole(Role::Admin).check(Some(&admin)).is_ok());
    }

    #[test]
    fn test_public_auth_routes() {
        let policy = app_policy();
        assert_eq!(policy.rule_for(&Method::POST, "/api/auth/register"), AccessRule::Public);
        assert_eq!(policy.rule_for(&Method::POST, "/api/auth/login"), AccessRule::Public);
        assert_eq!(policy.rule_for(&Method::GET, "/swagger-ui/index.html"), AccessRule::Public);
        assert_eq!(policy.rule_for(&Method::GET, "/api-docs/openapi.json"), AccessRule::Public);
    }

    #[test]
    fn test_most_specific_wins() {
        let policy = app_policy();

        // Literal beats the public wildcard it sits under
        assert_eq!(policy.rule_for(&Method::GET, "/api/auth/me"), AccessRule::Authenticated);

        // Method-bound beats method-agnostic at equal depth
        assert_eq!(policy.rule_for(&Method::GET, "/api/players"), AccessRule::Authenticated);
        assert_eq!(policy.rule_for(&Method::GET, "/api/players/12"), AccessRule::Authenticated);
        assert_eq!(
            policy.rule_for(&Method::POST, "/api/players"),
            AccessRule::HasRole(Role::Admin)
        );
        assert_eq!(
            policy.rule_for(&Method::DELETE, "/api/teams/3"),
            AccessRule::HasRole(Role::Admin)
        );
        assert_eq!(
            policy.rule_for(&Method::GET, "/api/teams/3/players"),
            AccessRule::Authenticated
        );
    }

    #[test]
    fn test_unmatched_routes_require_authentication() {
        let policy = app_policy();
        assert_eq!(policy.rule_for(&Method::GET, "/"), AccessRule::Authenticated);
        assert_eq!(policy.rule_for(&Method::GET, "/api/unknown"), AccessRule::Authenticated);
        // `*` is exactly one segment
        assert_eq!(policy.rule_for(&Method::GET, "/api/users/a/b"), AccessRule::Authenticated);
        // Prefix lookalikes do not match
        assert_eq!(policy.rule_for(&Method::POST, "/api/authx"), AccessRule::Authenticated);
        assert_eq!(policy.rule_for(&Method::POST, "/api/players-admin"), AccessRule::Authenticated);
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let policy = app_policy();
        assert_eq!(
            policy.rule_for(&Method::POST, "/api/players/"),
            AccessRule::HasRole(Role::Admin)
        );
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let policy = AuthorizationPolicy::new()
            .rule("/a/*", AccessRule::Public)
            .unwrap()
            .rule("/a/*", AccessRule::HasRole(Role::Admin))
            .unwrap();
        assert_eq!(policy.rule_for(&Method::GET, "/a/b"), AccessRule::Public);
    }

    #[test]
    fn test_closed_pattern_beats_open_ended() {
        let policy = AuthorizationPolicy::new()
            .rule("/a/**", AccessRule::Public)
            .unwrap()
            .rule("/a/*", AccessRule::HasRole(Role::Admin))
            .unwrap();
        assert_eq!(policy.rule_for(&Method::GET, "/a/b"), AccessRule::HasRole(Role::Admin));
        assert_eq!(policy.rule_for(&Method::GET, "/a/b/c"), AccessRule::Public);
        assert_eq!(policy.rule_for(&Method::GET, "/a"), AccessRule::Public);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            AuthorizationPolicy::new().public("api/x"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            AuthorizationPolicy::new().public("/api/**/x"),
            Err(PatternError::MisplacedDoubleStar(_))
        ));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let policy = AuthorizationPolicy::new().public("/files/a.b").unwrap();
        assert_eq!(policy.rule_for(&Method::GET, "/files/a.b"), AccessRule::Public);
        assert_eq!(policy.rule_for(&Method::GET, "/files/axb"), AccessRule::Authenticated);
    }

    #[test]
    fn test_distinct_failures_for_user_on_admin_route() {
        let policy = app_policy();
        let user = principal(&["USER"]);

        assert!(matches!(
            policy.check(&Method::POST, "/api/teams", None),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            policy.check(&Method::POST, "/api/teams", Some(&user)),
            Err(AuthError::InsufficientRole)
        ));
        assert!(policy.check(&Method::GET, "/api/teams", Some(&user)).is_ok());
    }

    #[test]
    fn test_head_follows_get_rules() {
        let policy = app_policy();
        let user = principal(&["USER"]);

        assert!(policy.check(&Method::HEAD, "/api/teams", Some(&user)).is_ok());
        assert!(policy.check(&Method::HEAD, "/api/players/7", Some(&user)).is_ok());
        assert!(matches!(
            policy.check(&Method::HEAD, "/api/teams", None),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            policy.check(&Method::DELETE, "/api/teams/1", Some(&user)),
            Err(AuthError::InsufficientRole)
        ));
    }
}
