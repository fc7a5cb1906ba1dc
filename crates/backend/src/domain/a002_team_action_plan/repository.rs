use chrono::Utc;
use contracts::domain::a002_team_action_plan::{TeamActionPlan, TeamActionPlanId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

mod team_action_plan {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a002_team_action_plan")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub kpi_ref: String,
        pub team_weight: f64,
        pub team_target: Option<f64>,
        pub monthly_targets_json: String,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use team_action_plan::{ActiveModel, Column, Entity, Model};

impl TryFrom<Model> for TeamActionPlan {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let id = TeamActionPlanId::from_string(&m.id).map_err(DbErr::Custom)?;
        let monthly_targets = serde_json::from_str(&m.monthly_targets_json).map_err(|e| {
            DbErr::Custom(format!("a002_team_action_plan: bad monthly_targets_json: {}", e))
        })?;

        Ok(TeamActionPlan {
            base: BaseAggregate::with_metadata(id, m.code, m.description, m.comment, metadata),
            kpi_ref: m.kpi_ref,
            team_weight: m.team_weight,
            team_target: m.team_target,
            monthly_targets,
        })
    }
}

fn to_active_model(plan: &TeamActionPlan) -> Result<ActiveModel, DbErr> {
    let monthly_targets_json =
        serde_json::to_string(&plan.monthly_targets).map_err(|e| DbErr::Custom(e.to_string()))?;
    Ok(ActiveModel {
        id: Set(plan.base.id.as_string()),
        code: Set(plan.base.code.clone()),
        description: Set(plan.base.description.clone()),
        comment: Set(plan.base.comment.clone()),
        kpi_ref: Set(plan.kpi_ref.clone()),
        team_weight: Set(plan.team_weight),
        team_target: Set(plan.team_target),
        monthly_targets_json: Set(monthly_targets_json),
        is_deleted: Set(plan.base.metadata.is_deleted),
        created_at: Set(Some(plan.base.metadata.created_at)),
        updated_at: Set(Some(plan.base.metadata.updated_at)),
        version: Set(plan.base.metadata.version),
    })
}

fn collect(models: Vec<Model>) -> Result<Vec<TeamActionPlan>, DbErr> {
    models.into_iter().map(TeamActionPlan::try_from).collect()
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<TeamActionPlan>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::KpiRef)
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    collect(models)
}

/// Планы команд по одному KPI
pub async fn list_by_kpi(db: &DatabaseConnection, kpi_ref: &str) -> Result<Vec<TeamActionPlan>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::KpiRef.eq(kpi_ref))
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    collect(models)
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: &TeamActionPlanId,
) -> Result<Option<TeamActionPlan>, DbErr> {
    let model = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(TeamActionPlan::try_from).transpose()
}

pub async fn insert(db: &DatabaseConnection, plan: &TeamActionPlan) -> Result<(), DbErr> {
    let mut active_model = to_active_model(plan)?;
    active_model.version = Set(1);
    active_model.insert(db).await?;
    Ok(())
}

pub async fn update(db: &DatabaseConnection, plan: &TeamActionPlan) -> Result<(), DbErr> {
    let mut active_model = to_active_model(plan)?;
    active_model.updated_at = Set(Some(Utc::now()));
    active_model.version = Set(plan.base.metadata.version + 1);
    Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn soft_delete(db: &DatabaseConnection, id: &TeamActionPlanId) -> Result<bool, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.as_string()))
        .filter(Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;

    #[tokio::test]
    async fn test_roundtrip_and_list_by_kpi() {
        let db = memory_db().await;
        let mut north = TeamActionPlan::new_for_insert("T1".into(), "North".into(), "kpi-a".into(), 10.0);
        north.team_target = Some(120.0);
        north.monthly_targets.insert("2025-01".into(), 10.0);
        let south = TeamActionPlan::new_for_insert("T2".into(), "South".into(), "kpi-b".into(), 5.0);
        insert(&db, &north).await.unwrap();
        insert(&db, &south).await.unwrap();

        let plans = list_by_kpi(&db, "kpi-a").await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].team_name(), "North");
        assert_eq!(plans[0].team_target, Some(120.0));
        assert_eq!(plans[0].target_at("2025-01"), Some(10.0));

        assert!(soft_delete(&db, &north.base.id).await.unwrap());
        assert!(list_by_kpi(&db, "kpi-a").await.unwrap().is_empty());
        assert_eq!(list_all(&db).await.unwrap().len(), 1);
    }
}
