use super::repository;
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::{sanitize_opt, sanitize_plain};
use contracts::domain::a005_employee::{ApprovalCheck, Employee, EmployeeDto, EmployeeId};
use contracts::domain::common::AggregateId;
use contracts::shared::list_query::{ListState, Page};
use sea_orm::DatabaseConnection;

pub fn parse_id(id: &str) -> ServiceResult<EmployeeId> {
    EmployeeId::from_string(id).map_err(ServiceError::Validation)
}

fn sanitize_dto(dto: EmployeeDto) -> EmployeeDto {
    EmployeeDto {
        code: dto.code.trim().to_string(),
        full_name: sanitize_plain(&dto.full_name),
        position: sanitize_plain(&dto.position),
        team: sanitize_plain(&dto.team),
        comment: sanitize_opt(dto.comment),
        ..dto
    }
}

async fn ensure_code_is_free(
    db: &DatabaseConnection,
    code: &str,
    own_id: Option<EmployeeId>,
) -> ServiceResult<()> {
    if let Some(existing) = repository::find_by_code(db, code).await? {
        if Some(existing.base.id) != own_id {
            return Err(ServiceError::Conflict(format!("Employee number {} already exists", code)));
        }
    }
    Ok(())
}

async fn ensure_manager_exists(db: &DatabaseConnection, employee: &Employee) -> ServiceResult<()> {
    if let Some(manager_ref) = &employee.manager_ref {
        get_by_id(db, manager_ref).await?;
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, dto: EmployeeDto) -> ServiceResult<EmployeeId> {
    let dto = sanitize_dto(dto);
    let mut employee = Employee::new_for_insert(
        dto.code.clone(),
        dto.full_name.clone(),
        dto.position.clone(),
        dto.team.clone(),
        dto.role,
    );
    employee.update(&dto);
    employee.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &employee.base.code, None).await?;
    ensure_manager_exists(db, &employee).await?;

    employee.before_write();
    repository::insert(db, &employee).await?;
    tracing::info!("Created employee {} ({})", employee.base.code, employee.full_name());
    Ok(employee.base.id)
}

pub async fn update(db: &DatabaseConnection, dto: EmployeeDto) -> ServiceResult<EmployeeId> {
    let id_str = dto
        .id
        .clone()
        .ok_or_else(|| ServiceError::Validation("ID is required for update".into()))?;
    let mut employee = get_by_id(db, &id_str).await?;

    let dto = sanitize_dto(dto);
    employee.update(&dto);
    employee.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &employee.base.code, Some(employee.base.id)).await?;
    ensure_manager_exists(db, &employee).await?;

    employee.before_write();
    repository::update(db, &employee).await?;
    Ok(employee.base.id)
}

pub async fn upsert(db: &DatabaseConnection, dto: EmployeeDto) -> ServiceResult<EmployeeId> {
    if dto.id.is_some() {
        update(db, dto).await
    } else {
        create(db, dto).await
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<Employee> {
    let employee_id = parse_id(id)?;
    repository::find_by_id(db, &employee_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Employee {}", id)))
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    let employee_id = parse_id(id)?;
    if !repository::soft_delete(db, &employee_id).await? {
        return Err(ServiceError::not_found(format!("Employee {}", id)));
    }
    tracing::info!("Deleted employee {}", id);
    Ok(())
}

pub async fn list(db: &DatabaseConnection, state: &ListState) -> ServiceResult<Page<Employee>> {
    let all = repository::list_all(db).await?;
    Ok(state.apply(&all))
}

/// Может ли сотрудник `approver_id` утверждать показатели `target_id`
pub async fn can_approve(
    db: &DatabaseConnection,
    approver_id: &str,
    target_id: &str,
) -> ServiceResult<ApprovalCheck> {
    let approver = get_by_id(db, approver_id).await?;
    let target = get_by_id(db, target_id).await?;
    Ok(ApprovalCheck {
        approver_id: approver.to_string_id(),
        target_id: target.to_string_id(),
        allowed: approver.can_approve(&target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::auth::Role;
    use crate::shared::data::db::testing::memory_db;

    fn dto(code: &str, name: &str, role: Role) -> EmployeeDto {
        EmployeeDto {
            id: None,
            code: code.into(),
            full_name: name.into(),
            position: String::new(),
            team: "North".into(),
            email: None,
            role,
            manager_ref: None,
            is_active: true,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_number_and_bad_email() {
        let db = memory_db().await;
        create(&db, dto("E-1", "Ann Lee", Role::Staff)).await.unwrap();
        let err = create(&db, dto("E-1", "Bob Ray", Role::Staff)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let mut bad = dto("E-2", "Bob Ray", Role::Staff);
        bad.email = Some("bob.example.com".into());
        let err = create(&db, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_approval_follows_rank() {
        let db = memory_db().await;
        let director = create(&db, dto("E-1", "Dana", Role::Director)).await.unwrap().as_string();
        let manager = create(&db, dto("E-2", "Mark", Role::Manager)).await.unwrap().as_string();
        let peer = create(&db, dto("E-3", "Mia", Role::Manager)).await.unwrap().as_string();

        assert!(can_approve(&db, &director, &manager).await.unwrap().allowed);
        assert!(!can_approve(&db, &manager, &director).await.unwrap().allowed);
        assert!(!can_approve(&db, &manager, &peer).await.unwrap().allowed);
        assert!(!can_approve(&db, &director, &director).await.unwrap().allowed);

        let mut inactive = get_by_id(&db, &director).await.unwrap();
        inactive.is_active = false;
        repository::update(&db, &inactive).await.unwrap();
        assert!(!can_approve(&db, &director, &manager).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_manager_must_exist() {
        let db = memory_db().await;
        let mut orphan = dto("E-9", "Olga", Role::Staff);
        orphan.manager_ref = Some(EmployeeId::new_v4().as_string());
        let err = create(&db, orphan).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
