use super::repository;
use crate::domain::{a002_team_action_plan, a005_employee};
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::{sanitize_opt, sanitize_plain};
use contracts::domain::a001_kpi::ActualEntryDto;
use contracts::domain::a003_individual_performance::{
    reconcile_individuals, IndividualPerformance, IndividualPerformanceDto, IndividualPerformanceId,
};
use contracts::domain::common::AggregateId;
use contracts::shared::aggregation::AllocationCheck;
use contracts::shared::list_query::ListFilter;
use contracts::shared::period_label::{parse_period_label, period_label};
use sea_orm::DatabaseConnection;

pub fn parse_id(id: &str) -> ServiceResult<IndividualPerformanceId> {
    IndividualPerformanceId::from_string(id).map_err(ServiceError::Validation)
}

fn sanitize_dto(dto: IndividualPerformanceDto) -> IndividualPerformanceDto {
    IndividualPerformanceDto {
        name: sanitize_plain(&dto.name),
        position: sanitize_plain(&dto.position),
        comment: sanitize_opt(dto.comment),
        ..dto
    }
}

/// Ссылки на план команды и сотрудника должны указывать на существующие записи
async fn check_references(
    db: &DatabaseConnection,
    entry: &IndividualPerformance,
) -> ServiceResult<()> {
    a002_team_action_plan::service::get_by_id(db, &entry.team_plan_ref).await?;
    if let Some(employee_ref) = &entry.employee_ref {
        a005_employee::service::get_by_id(db, employee_ref).await?;
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    dto: IndividualPerformanceDto,
) -> ServiceResult<IndividualPerformanceId> {
    let dto = sanitize_dto(dto);
    let mut entry = IndividualPerformance::new_for_insert(
        dto.code.clone().unwrap_or_default(),
        dto.name.clone(),
        dto.team_plan_ref.clone(),
        dto.position.clone(),
        dto.individual_weight,
    );
    entry.update(&dto);
    entry.validate().map_err(ServiceError::Validation)?;
    check_references(db, &entry).await?;

    entry.before_write();
    repository::insert(db, &entry).await?;
    tracing::info!(
        "Created individual performance {} ({}) in plan {}",
        entry.base.code,
        entry.name(),
        entry.team_plan_ref
    );
    Ok(entry.base.id)
}

pub async fn update(
    db: &DatabaseConnection,
    dto: IndividualPerformanceDto,
) -> ServiceResult<IndividualPerformanceId> {
    let id_str = dto
        .id
        .clone()
        .ok_or_else(|| ServiceError::Validation("ID is required for update".into()))?;
    let mut entry = get_by_id(db, &id_str).await?;

    let dto = sanitize_dto(dto);
    entry.update(&dto);
    entry.validate().map_err(ServiceError::Validation)?;
    check_references(db, &entry).await?;

    entry.before_write();
    repository::update(db, &entry).await?;
    Ok(entry.base.id)
}

pub async fn upsert(
    db: &DatabaseConnection,
    dto: IndividualPerformanceDto,
) -> ServiceResult<IndividualPerformanceId> {
    if dto.id.is_some() {
        update(db, dto).await
    } else {
        create(db, dto).await
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<IndividualPerformance> {
    let entry_id = parse_id(id)?;
    repository::find_by_id(db, &entry_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Individual performance {}", id)))
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    let entry_id = parse_id(id)?;
    if !repository::soft_delete(db, &entry_id).await? {
        return Err(ServiceError::not_found(format!("Individual performance {}", id)));
    }
    Ok(())
}

/// Исполнители плана (или все); статус в фильтре сравнивается с ручным статусом записи
pub async fn list(
    db: &DatabaseConnection,
    team_plan_ref: Option<&str>,
    filter: &ListFilter,
) -> ServiceResult<Vec<IndividualPerformance>> {
    let entries = match team_plan_ref {
        Some(plan) => repository::list_by_team_plan(db, plan).await?,
        None => repository::list_all(db).await?,
    };
    Ok(filter.apply(&entries))
}

/// Ввод факта исполнителя за месяц
pub async fn enter_actual(
    db: &DatabaseConnection,
    id: &str,
    entry: ActualEntryDto,
) -> ServiceResult<IndividualPerformance> {
    let mut record = get_by_id(db, id).await?;
    let period = parse_period_label(&entry.period)
        .map(period_label)
        .map_err(ServiceError::Validation)?;
    if period != entry.period {
        return Err(ServiceError::Validation(format!(
            "Invalid period label '{}', expected YYYY-MM",
            entry.period
        )));
    }
    match entry.actual {
        Some(value) if !value.is_finite() => {
            return Err(ServiceError::Validation("Actual must be a finite number".into()));
        }
        Some(value) => {
            record.monthly_actuals.insert(period, value);
        }
        None => {
            record.monthly_actuals.remove(&period);
        }
    }
    record.before_write();
    repository::update(db, &record).await?;
    get_by_id(db, id).await
}

/// Сверка весов исполнителей с весом команды
pub async fn allocation_check(db: &DatabaseConnection, team_plan_id: &str) -> ServiceResult<AllocationCheck> {
    let plan = a002_team_action_plan::service::get_by_id(db, team_plan_id).await?;
    let entries = repository::list_by_team_plan(db, team_plan_id).await?;
    let check = reconcile_individuals(&plan, &entries);
    if check.over_allocated {
        tracing::warn!(
            "Team plan {}: individual weights {:.2} exceed team weight {:.2}",
            plan.base.code,
            check.allocated,
            check.parent
        );
    }
    Ok(check)
}
