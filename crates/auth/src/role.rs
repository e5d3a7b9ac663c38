//! Role model resolved from the backend.

use serde::{Deserialize, Serialize};

use trackacademy_core::AcademyId;

/// Authorization role attached to an authenticated user.
///
/// The set is closed. A payload carrying a role outside this set fails to
/// deserialize, so backend contract drift surfaces at the boundary instead of
/// silently routing the user to a default screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleInfo {
    /// Platform operator with cross-academy access.
    SuperAdmin,

    /// Staff member scoped to a single academy.
    ///
    /// `academy_id` is optional on the wire. The route guard treats a missing
    /// assignment as an access-denied condition; decoding does not reject it.
    AcademyUser {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        academy_id: Option<AcademyId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        academy_name: Option<String>,
    },

    /// Athlete account. The admin console has no surface for players.
    Player,
}

impl RoleInfo {
    pub fn label(&self) -> &'static str {
        match self {
            RoleInfo::SuperAdmin => "super_admin",
            RoleInfo::AcademyUser { .. } => "academy_user",
            RoleInfo::Player => "player",
        }
    }

    /// Academy assignment, when the role carries one.
    pub fn academy_id(&self) -> Option<&AcademyId> {
        match self {
            RoleInfo::AcademyUser { academy_id, .. } => academy_id.as_ref(),
            _ => None,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, RoleInfo::SuperAdmin)
    }
}

impl core::fmt::Display for RoleInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_known_role() {
        let super_admin: RoleInfo = serde_json::from_str(r#"{"role":"super_admin"}"#).unwrap();
        assert_eq!(super_admin, RoleInfo::SuperAdmin);

        let academy: RoleInfo = serde_json::from_str(
            r#"{"role":"academy_user","academy_id":"acad_7","academy_name":"Northside"}"#,
        )
        .unwrap();
        assert_eq!(
            academy,
            RoleInfo::AcademyUser {
                academy_id: Some(AcademyId::new("acad_7")),
                academy_name: Some("Northside".to_string()),
            }
        );

        let player: RoleInfo = serde_json::from_str(r#"{"role":"player"}"#).unwrap();
        assert_eq!(player, RoleInfo::Player);
    }

    #[test]
    fn rejects_unknown_role_label() {
        let result: Result<RoleInfo, _> = serde_json::from_str(r#"{"role":"referee"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("referee"), "error should name the bad label: {err}");
    }

    #[test]
    fn academy_user_without_assignment_decodes_to_none() {
        let role: RoleInfo = serde_json::from_str(r#"{"role":"academy_user"}"#).unwrap();
        assert_eq!(role.academy_id(), None);

        let explicit_null: RoleInfo =
            serde_json::from_str(r#"{"role":"academy_user","academy_id":null}"#).unwrap();
        assert_eq!(explicit_null.academy_id(), None);
    }

    #[test]
    fn serializes_with_role_tag() {
        let json = serde_json::to_string(&RoleInfo::SuperAdmin).unwrap();
        assert_eq!(json, r#"{"role":"super_admin"}"#);

        let json = serde_json::to_string(&RoleInfo::AcademyUser {
            academy_id: Some(AcademyId::new("acad_7")),
            academy_name: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"academy_user","academy_id":"acad_7"}"#);
    }

    #[test]
    fn accessors_reflect_variant() {
        let role = RoleInfo::AcademyUser {
            academy_id: Some(AcademyId::new("acad_9")),
            academy_name: Some("Harbor City".to_string()),
        };
        assert_eq!(role.label(), "academy_user");
        assert_eq!(role.academy_id().map(|id| id.as_str()), Some("acad_9"));
        assert!(!role.is_super_admin());
        assert!(RoleInfo::SuperAdmin.is_super_admin());
    }
}
