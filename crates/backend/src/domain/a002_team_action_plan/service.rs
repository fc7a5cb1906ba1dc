use super::repository;
use crate::domain::a001_kpi;
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::{sanitize_opt, sanitize_plain};
use contracts::domain::a002_team_action_plan::{
    reconcile_team_plans, TeamActionPlan, TeamActionPlanDto, TeamActionPlanId, TeamAllocationReport,
};
use contracts::domain::common::AggregateId;
use contracts::shared::list_query::ListFilter;
use sea_orm::DatabaseConnection;

pub fn parse_id(id: &str) -> ServiceResult<TeamActionPlanId> {
    TeamActionPlanId::from_string(id).map_err(ServiceError::Validation)
}

fn sanitize_dto(dto: TeamActionPlanDto) -> TeamActionPlanDto {
    TeamActionPlanDto {
        team_name: sanitize_plain(&dto.team_name),
        comments: sanitize_opt(dto.comments),
        ..dto
    }
}

pub async fn create(db: &DatabaseConnection, dto: TeamActionPlanDto) -> ServiceResult<TeamActionPlanId> {
    let dto = sanitize_dto(dto);
    // Родительский KPI должен существовать
    a001_kpi::service::get_by_id(db, &dto.kpi_ref).await?;

    let mut plan = TeamActionPlan::new_for_insert(
        dto.code.clone().unwrap_or_default(),
        dto.team_name.clone(),
        dto.kpi_ref.clone(),
        dto.team_weight,
    );
    plan.update(&dto);
    plan.validate().map_err(ServiceError::Validation)?;
    plan.before_write();
    repository::insert(db, &plan).await?;
    tracing::info!("Created team action plan {} for KPI {}", plan.base.code, plan.kpi_ref);
    Ok(plan.base.id)
}

pub async fn update(db: &DatabaseConnection, dto: TeamActionPlanDto) -> ServiceResult<TeamActionPlanId> {
    let id_str = dto
        .id
        .clone()
        .ok_or_else(|| ServiceError::Validation("ID is required for update".into()))?;
    let mut plan = get_by_id(db, &id_str).await?;
    let dto = sanitize_dto(dto);
    if dto.kpi_ref != plan.kpi_ref {
        a001_kpi::service::get_by_id(db, &dto.kpi_ref).await?;
    }

    plan.update(&dto);
    plan.validate().map_err(ServiceError::Validation)?;
    plan.before_write();
    repository::update(db, &plan).await?;
    Ok(plan.base.id)
}

pub async fn upsert(db: &DatabaseConnection, dto: TeamActionPlanDto) -> ServiceResult<TeamActionPlanId> {
    if dto.id.is_some() {
        update(db, dto).await
    } else {
        create(db, dto).await
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<TeamActionPlan> {
    let plan_id = parse_id(id)?;
    repository::find_by_id(db, &plan_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Team action plan {}", id)))
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    let plan_id = parse_id(id)?;
    if !repository::soft_delete(db, &plan_id).await? {
        return Err(ServiceError::not_found(format!("Team action plan {}", id)));
    }
    Ok(())
}

/// Все планы или только планы одного KPI
/// Планы KPI (или все), отфильтрованные по коду и названию команды
pub async fn list(
    db: &DatabaseConnection,
    kpi_ref: Option<&str>,
    filter: &ListFilter,
) -> ServiceResult<Vec<TeamActionPlan>> {
    let plans = match kpi_ref {
        Some(kpi_ref) => repository::list_by_kpi(db, kpi_ref).await?,
        None => repository::list_all(db).await?,
    };
    Ok(filter.apply(&plans))
}

/// Сверка распределения веса и целей KPI между командами
pub async fn allocation_report(db: &DatabaseConnection, kpi_id: &str) -> ServiceResult<TeamAllocationReport> {
    let kpi = a001_kpi::service::get_by_id(db, kpi_id).await?;
    let plans = repository::list_by_kpi(db, kpi_id).await?;
    let report = reconcile_team_plans(&kpi, &plans);
    if !report.is_consistent() {
        tracing::warn!(
            "KPI {}: team allocation inconsistent (allocated {:.2} of {:.2}, {} month(s) mismatched)",
            kpi.base.code,
            report.weight.allocated,
            report.weight.parent,
            report.target_mismatches.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;
    use contracts::domain::a001_kpi::KpiDto;
    use contracts::enums::{KpiCategory, Perspective, UnitOfMeasure, YtdCalculation};
    use std::collections::BTreeMap;

    async fn seed_kpi(db: &DatabaseConnection) -> String {
        let dto = KpiDto {
            id: None,
            code: "C1.1".into(),
            description: "Customer satisfaction".into(),
            perspective: Perspective::Customer,
            definition: None,
            weight: 20.0,
            unit: UnitOfMeasure::Score,
            category: KpiCategory::Max,
            ytd_calculation: YtdCalculation::Average,
            targets: BTreeMap::from([("2025-01".to_string(), 100.0)]),
            actuals: None,
            problem: None,
            corrective_action: None,
            comment: None,
        };
        a001_kpi::service::create(db, dto).await.unwrap().as_string()
    }

    fn plan_dto(kpi_ref: &str, name: &str, weight: f64, jan: f64) -> TeamActionPlanDto {
        TeamActionPlanDto {
            id: None,
            code: None,
            kpi_ref: kpi_ref.into(),
            team_name: name.into(),
            team_weight: weight,
            team_target: None,
            monthly_targets: BTreeMap::from([("2025-01".to_string(), jan)]),
            comments: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn test_create_requires_existing_kpi() {
        let db = memory_db().await;
        let err = create(&db, plan_dto(&uuid::Uuid::new_v4().to_string(), "North", 10.0, 50.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_allocation_report_is_advisory() {
        let db = memory_db().await;
        let kpi_id = seed_kpi(&db).await;
        create(&db, plan_dto(&kpi_id, "North", 15.0, 70.0)).await.unwrap();
        create(&db, plan_dto(&kpi_id, "South", 10.0, 30.0)).await.unwrap();

        let report = allocation_report(&db, &kpi_id).await.unwrap();
        assert!(report.weight.over_allocated);
        assert!(report.target_mismatches.is_empty());

        let plans = list(&db, Some(&kpi_id), &ListFilter::default()).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.base.comment.is_none()));
        assert!(plans.iter().all(|p| p.base.code.starts_with("TAP-")));

        let filter = ListFilter {
            search: Some("sou".into()),
            ..Default::default()
        };
        let plans = list(&db, None, &filter).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].team_name(), "South");
    }
}
