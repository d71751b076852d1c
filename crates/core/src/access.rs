//! Ownership-based access checks.
//!
//! The viewer identity is resolved by the caller (session provider); this
//! module is a pure predicate over it and never performs I/O.

use serde::{Deserialize, Serialize};

/// The resolved identity of the current request: an authenticated user, an
/// anonymous draft session, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerContext {
    pub user_id: Option<i64>,
    pub anon_session_id: Option<String>,
}

impl ViewerContext {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            anon_session_id: None,
        }
    }

    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            anon_session_id: Some(session_id.into()),
        }
    }
}

/// The minimal ownership descriptor of a site.
///
/// An unclaimed draft has no `owner_id` but records the anonymous session
/// that created it, so its creator can keep editing before signing up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteOwnership {
    pub owner_id: Option<i64>,
    pub anon_session_id: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Whether `viewer` may read previews of and mutate `site`.
///
/// Owned sites admit exactly the owning user. Unowned drafts admit the
/// anonymous session recorded at creation time; a missing or blank session
/// id on either side denies.
pub fn can_access_site(site: &SiteOwnership, viewer: &ViewerContext) -> bool {
    if let Some(owner_id) = site.owner_id {
        return viewer.user_id == Some(owner_id);
    }

    match (non_blank(&site.anon_session_id), non_blank(&viewer.anon_session_id)) {
        (Some(site_session), Some(viewer_session)) => site_session == viewer_session,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(owner_id: i64) -> SiteOwnership {
        SiteOwnership {
            owner_id: Some(owner_id),
            anon_session_id: None,
        }
    }

    fn draft(session: &str) -> SiteOwnership {
        SiteOwnership {
            owner_id: None,
            anon_session_id: Some(session.to_string()),
        }
    }

    #[test]
    fn owner_can_access_owned_site() {
        assert!(can_access_site(&owned(7), &ViewerContext::user(7)));
    }

    #[test]
    fn non_owner_cannot_access_owned_site() {
        assert!(!can_access_site(&owned(7), &ViewerContext::user(8)));
    }

    #[test]
    fn anonymous_viewer_cannot_access_owned_site() {
        // Even the session that created the draft loses access once claimed.
        let site = SiteOwnership {
            owner_id: Some(7),
            anon_session_id: Some("s-1".to_string()),
        };
        assert!(!can_access_site(&site, &ViewerContext::anonymous("s-1")));
        assert!(!can_access_site(&site, &ViewerContext::default()));
    }

    #[test]
    fn matching_anon_session_can_access_unowned_draft() {
        assert!(can_access_site(&draft("s-1"), &ViewerContext::anonymous("s-1")));
    }

    #[test]
    fn mismatched_or_missing_anon_session_is_denied() {
        assert!(!can_access_site(&draft("s-1"), &ViewerContext::anonymous("s-2")));
        assert!(!can_access_site(&draft("s-1"), &ViewerContext::default()));
        assert!(!can_access_site(&draft("s-1"), &ViewerContext::user(7)));
    }

    #[test]
    fn blank_session_ids_never_match() {
        assert!(!can_access_site(&draft("  "), &ViewerContext::anonymous("  ")));
        let site = SiteOwnership::default();
        assert!(!can_access_site(&site, &ViewerContext::anonymous("s-1")));
    }
}
