use crate::domain::common::{AggregateId, BaseAggregate};
use crate::shared::list_query::Filterable;
use crate::system::auth::{can_approve, Role};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// ID типа для агрегата сотрудника
    EmployeeId
);

/// Сотрудник
///
/// `code` хранит табельный номер, `description` ФИО.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(flatten)]
    pub base: BaseAggregate<EmployeeId>,

    pub position: String,
    pub team: String,
    pub email: Option<String>,
    pub role: Role,
    /// ID непосредственного руководителя
    pub manager_ref: Option<String>,
    pub is_active: bool,
}

impl Employee {
    pub fn new_for_insert(code: String, full_name: String, position: String, team: String, role: Role) -> Self {
        Self {
            base: BaseAggregate::new(EmployeeId::new_v4(), code, full_name),
            position,
            team,
            email: None,
            role,
            manager_ref: None,
            is_active: true,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn full_name(&self) -> &str {
        &self.base.description
    }

    /// Неактивный сотрудник ничего не утверждает
    pub fn can_approve(&self, other: &Employee) -> bool {
        self.is_active && self.base.id != other.base.id && can_approve(self.role, other.role)
    }

    pub fn update(&mut self, dto: &EmployeeDto) {
        self.base.code = dto.code.trim().to_string();
        self.base.description = dto.full_name.trim().to_string();
        self.base.comment = dto.comment.clone();
        self.position = dto.position.trim().to_string();
        self.team = dto.team.trim().to_string();
        self.email = dto
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self.role = dto.role;
        self.manager_ref = dto.manager_ref.clone().filter(|s| !s.trim().is_empty());
        self.is_active = dto.is_active;
    }

    pub fn validate(&self) -> Result<(), String> {
        self.base.validate_identity()?;
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(format!("Invalid email format: {}", email));
            }
        }
        if self.manager_ref.as_deref() == Some(self.to_string_id().as_str()) {
            return Err("Employee cannot be their own manager".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

crate::impl_aggregate_root!(Employee, EmployeeId, "a005", "employee", "Employee", "Employees");

impl Filterable for Employee {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.base.code, &self.base.description, &self.position, &self.team]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDto {
    pub id: Option<String>,
    pub code: String,
    pub full_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub team: String,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub manager_ref: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub comment: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Ответ проверки права утверждения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalCheck {
    pub approver_id: String,
    pub target_id: String,
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(code: &str, role: Role) -> Employee {
        Employee::new_for_insert(code.into(), format!("Employee {}", code), "Analyst".into(), "North".into(), role)
    }

    #[test]
    fn test_can_approve() {
        let manager = employee("E1", Role::Manager);
        let staff = employee("E2", Role::Staff);
        let admin = employee("E3", Role::Admin);

        assert!(manager.can_approve(&staff));
        assert!(!staff.can_approve(&manager));
        assert!(admin.can_approve(&manager));
        assert!(!admin.can_approve(&admin));

        let mut inactive = employee("E4", Role::Director);
        inactive.is_active = false;
        assert!(!inactive.can_approve(&staff));
    }

    #[test]
    fn test_validate() {
        let mut e = employee("E1", Role::Staff);
        assert!(e.validate().is_ok());

        e.email = Some("not-an-email".into());
        assert!(e.validate().is_err());

        e.email = None;
        e.manager_ref = Some(e.to_string_id());
        assert!(e.validate().is_err());
    }
}
