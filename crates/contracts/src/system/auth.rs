use serde::{Deserialize, Serialize};

// ============================================================================
// Roles
// ============================================================================

/// Роль пользователя/сотрудника, упорядочена по старшинству
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Director,
    Manager,
    Supervisor,
    Staff,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Director => "director",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
            Role::Staff => "staff",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Director => "Director",
            Role::Manager => "Manager",
            Role::Supervisor => "Supervisor",
            Role::Staff => "Staff",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(Role::Admin),
            "director" => Some(Role::Director),
            "manager" => Some(Role::Manager),
            "supervisor" => Some(Role::Supervisor),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn all() -> Vec<Role> {
        vec![
            Role::Admin,
            Role::Director,
            Role::Manager,
            Role::Supervisor,
            Role::Staff,
        ]
    }

    /// Старшинство: чем больше, тем выше
    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 5,
            Role::Director => 4,
            Role::Manager => 3,
            Role::Supervisor => 2,
            Role::Staff => 1,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_periods(&self) -> bool {
        matches!(self, Role::Admin | Role::Director)
    }

    pub fn can_edit_kpi(&self) -> bool {
        matches!(self, Role::Admin | Role::Director | Role::Manager)
    }

    pub fn can_enter_actuals(&self) -> bool {
        !matches!(self, Role::Staff)
    }

    pub fn can_manage_employees(&self) -> bool {
        matches!(self, Role::Admin | Role::Director)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Staff
    }
}

/// Может ли `approver` утверждать показатели сотрудника с ролью `target`
///
/// Администратор утверждает любого, остальные только строго младших.
pub fn can_approve(approver: Role, target: Role) -> bool {
    approver.is_admin() || approver.rank() > target.rank()
}

// ============================================================================
// Session
// ============================================================================

/// JWT Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Expiration timestamp
    pub exp: usize,
    /// Issued at
    pub iat: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Данные текущего пользователя
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_approve_is_irreflexive_except_admin() {
        for role in Role::all() {
            assert_eq!(can_approve(role, role), role.is_admin(), "{:?}", role);
        }
    }

    #[test]
    fn test_can_approve_follows_rank() {
        assert!(can_approve(Role::Director, Role::Manager));
        assert!(can_approve(Role::Manager, Role::Staff));
        assert!(!can_approve(Role::Supervisor, Role::Manager));
        assert!(!can_approve(Role::Director, Role::Admin));
        assert!(can_approve(Role::Admin, Role::Admin));
    }

    #[test]
    fn test_capabilities() {
        assert!(Role::Director.can_manage_periods());
        assert!(!Role::Manager.can_manage_periods());
        assert!(Role::Manager.can_edit_kpi());
        assert!(!Role::Supervisor.can_edit_kpi());
        assert!(Role::Supervisor.can_enter_actuals());
        assert!(!Role::Staff.can_enter_actuals());
        assert!(!Role::Manager.can_manage_employees());
    }

    #[test]
    fn test_role_codes() {
        for role in Role::all() {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(serde_json::to_string(&Role::Supervisor).unwrap(), "\"supervisor\"");
    }
}
