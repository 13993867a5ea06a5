//! Per-request authorization.
//!
//! Access is granted when the requested menu equals the caller's role id and
//! the request verb is one of the comma-separated verbs recorded for that menu
//! in the token's `menu_access` snapshot.

use crate::error::{AppError, Result};
use crate::models::session::{Actor, SessionClaims};

/// The outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Carries the actor to attach to the downstream call.
    Allow(Actor),
    Deny(String),
}

impl Decision {
    /// Converts a denial into a `Forbidden` error.
    pub fn into_result(self) -> Result<Actor> {
        match self {
            Decision::Allow(actor) => Ok(actor),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Decides whether `claims` may use `requested_verb` against `requested_menu_id`.
///
/// Never fails: anything that does not match is a `Deny`.
pub fn authorize(claims: &SessionClaims, requested_menu_id: &str, requested_verb: &str) -> Decision {
    if requested_menu_id != claims.role_id {
        return Decision::Deny("You do not have access to this menu".to_string());
    }

    let allowed = claims
        .menu_access
        .get(requested_menu_id)
        .map(|verbs| verbs.split(',').any(|verb| verb == requested_verb))
        .unwrap_or(false);

    if !allowed {
        return Decision::Deny(format!("Method {} not allowed", requested_verb));
    }

    Decision::Allow(Actor {
        username: claims.subject.clone(),
        role_id: claims.role_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;

    fn claims(role: &str, access: &[(&str, &str)]) -> SessionClaims {
        SessionClaims {
            subject: "alice".to_string(),
            role_id: role.to_string(),
            menu_access: access
                .iter()
                .map(|(m, v)| (m.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn allows_listed_verb_on_own_menu() {
        let c = claims("admin", &[("admin", "GET,POST,DELETE")]);
        assert_eq!(
            authorize(&c, "admin", "POST"),
            Decision::Allow(Actor {
                username: "alice".to_string(),
                role_id: "admin".to_string(),
            })
        );
    }

    #[test]
    fn denies_menu_other_than_role() {
        let c = claims("admin", &[("admin", "GET"), ("ops", "GET")]);
        let decision = authorize(&c, "ops", "GET");
        assert!(!decision.is_allowed());
        assert!(matches!(decision.into_result(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn denies_unlisted_verb() {
        let c = claims("admin", &[("admin", "GET,POST")]);
        assert!(!authorize(&c, "admin", "DELETE").is_allowed());
    }

    #[test]
    fn denies_when_menu_has_no_entry() {
        let c = claims("admin", &[]);
        assert!(!authorize(&c, "admin", "GET").is_allowed());
    }

    #[test]
    fn verbs_match_exactly() {
        let c = claims("admin", &[("admin", "GET, POST")]);
        assert!(authorize(&c, "admin", "GET").is_allowed());
        assert!(!authorize(&c, "admin", "POST").is_allowed());
        assert!(!authorize(&c, "admin", "get").is_allowed());
    }

    #[test]
    fn decision_matches_the_access_rule_for_every_combination() {
        let menus = ["admin", "ops", ""];
        let verbs = ["GET", "POST", "PUT", "DELETE"];
        let c = claims("admin", &[("admin", "GET,PUT"), ("ops", "GET,POST,PUT,DELETE")]);

        for menu in menus {
            for verb in verbs {
                let expected = c.role_id == menu
                    && c.menu_access
                        .get(menu)
                        .map(|v| v.split(',').any(|x| x == verb))
                        .unwrap_or(false);
                assert_eq!(authorize(&c, menu, verb).is_allowed(), expected, "{menu} {verb}");
            }
        }
    }
}
