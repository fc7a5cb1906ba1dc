use chrono::Utc;
use contracts::domain::a001_kpi::PeriodValues;
use contracts::domain::a003_individual_performance::{IndividualPerformance, IndividualPerformanceId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::enums::PerformanceStatus;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

mod individual_performance {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a003_individual_performance")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub team_plan_ref: String,
        pub employee_ref: Option<String>,
        pub position: String,
        pub individual_weight: f64,
        pub monthly_targets_json: String,
        pub monthly_actuals_json: String,
        pub status: Option<String>,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use individual_performance::{ActiveModel, Column, Entity, Model};

fn values_from_json(field: &str, json: &str) -> Result<PeriodValues, DbErr> {
    serde_json::from_str(json)
        .map_err(|e| DbErr::Custom(format!("a003_individual_performance: bad {}: {}", field, e)))
}

fn values_to_json(values: &PeriodValues) -> Result<String, DbErr> {
    serde_json::to_string(values).map_err(|e| DbErr::Custom(e.to_string()))
}

impl TryFrom<Model> for IndividualPerformance {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let id = IndividualPerformanceId::from_string(&m.id).map_err(DbErr::Custom)?;
        let status = match m.status.as_deref() {
            None | Some("") => None,
            Some(code) => Some(PerformanceStatus::from_code(code).ok_or_else(|| {
                DbErr::Custom(format!("a003_individual_performance: unexpected status '{}'", code))
            })?),
        };

        Ok(IndividualPerformance {
            base: BaseAggregate::with_metadata(id, m.code, m.description, m.comment, metadata),
            team_plan_ref: m.team_plan_ref,
            employee_ref: m.employee_ref,
            position: m.position,
            individual_weight: m.individual_weight,
            monthly_targets: values_from_json("monthly_targets_json", &m.monthly_targets_json)?,
            monthly_actuals: values_from_json("monthly_actuals_json", &m.monthly_actuals_json)?,
            status,
        })
    }
}

fn to_active_model(entry: &IndividualPerformance) -> Result<ActiveModel, DbErr> {
    Ok(ActiveModel {
        id: Set(entry.base.id.as_string()),
        code: Set(entry.base.code.clone()),
        description: Set(entry.base.description.clone()),
        comment: Set(entry.base.comment.clone()),
        team_plan_ref: Set(entry.team_plan_ref.clone()),
        employee_ref: Set(entry.employee_ref.clone()),
        position: Set(entry.position.clone()),
        individual_weight: Set(entry.individual_weight),
        monthly_targets_json: Set(values_to_json(&entry.monthly_targets)?),
        monthly_actuals_json: Set(values_to_json(&entry.monthly_actuals)?),
        status: Set(entry.status.map(|s| s.code().to_string())),
        is_deleted: Set(entry.base.metadata.is_deleted),
        created_at: Set(Some(entry.base.metadata.created_at)),
        updated_at: Set(Some(entry.base.metadata.updated_at)),
        version: Set(entry.base.metadata.version),
    })
}

fn collect(models: Vec<Model>) -> Result<Vec<IndividualPerformance>, DbErr> {
    models.into_iter().map(IndividualPerformance::try_from).collect()
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<IndividualPerformance>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::TeamPlanRef)
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    collect(models)
}

/// Исполнители одного плана команды
pub async fn list_by_team_plan(
    db: &DatabaseConnection,
    team_plan_ref: &str,
) -> Result<Vec<IndividualPerformance>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::TeamPlanRef.eq(team_plan_ref))
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    collect(models)
}

/// Исполнители сразу нескольких планов (для каскада одного KPI)
pub async fn list_by_team_plans(
    db: &DatabaseConnection,
    team_plan_refs: Vec<String>,
) -> Result<Vec<IndividualPerformance>, DbErr> {
    if team_plan_refs.is_empty() {
        return Ok(Vec::new());
    }
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::TeamPlanRef.is_in(team_plan_refs))
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    collect(models)
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: &IndividualPerformanceId,
) -> Result<Option<IndividualPerformance>, DbErr> {
    let model = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(IndividualPerformance::try_from).transpose()
}

pub async fn insert(db: &DatabaseConnection, entry: &IndividualPerformance) -> Result<(), DbErr> {
    let mut active_model = to_active_model(entry)?;
    active_model.version = Set(1);
    active_model.insert(db).await?;
    Ok(())
}

pub async fn update(db: &DatabaseConnection, entry: &IndividualPerformance) -> Result<(), DbErr> {
    let mut active_model = to_active_model(entry)?;
    active_model.updated_at = Set(Some(Utc::now()));
    active_model.version = Set(entry.base.metadata.version + 1);
    Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn soft_delete(db: &DatabaseConnection, id: &IndividualPerformanceId) -> Result<bool, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.as_string()))
        .filter(Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
