use chrono::Utc;
use contracts::domain::a001_kpi::{Kpi, KpiId, PeriodValues};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::enums::{KpiCategory, Perspective, UnitOfMeasure, YtdCalculation};
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

mod kpi {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_kpi")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub perspective: String,
        pub definition: String,
        pub weight: f64,
        pub unit: String,
        pub category: String,
        pub ytd_calculation: String,
        pub targets_json: String,
        pub actuals_json: String,
        pub problem: Option<String>,
        pub corrective_action: Option<String>,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

fn corrupt(field: &str, value: &str) -> DbErr {
    DbErr::Custom(format!("a001_kpi: unexpected {} '{}'", field, value))
}

fn values_from_json(field: &str, json: &str) -> Result<PeriodValues, DbErr> {
    serde_json::from_str(json).map_err(|e| DbErr::Custom(format!("a001_kpi: bad {}: {}", field, e)))
}

fn values_to_json(values: &PeriodValues) -> Result<String, DbErr> {
    serde_json::to_string(values).map_err(|e| DbErr::Custom(e.to_string()))
}

impl TryFrom<kpi::Model> for Kpi {
    type Error = DbErr;

    fn try_from(m: kpi::Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let id = KpiId::from_string(&m.id).map_err(DbErr::Custom)?;

        Ok(Kpi {
            base: BaseAggregate::with_metadata(id, m.code, m.description, m.comment, metadata),
            perspective: Perspective::from_code(&m.perspective)
                .ok_or_else(|| corrupt("perspective", &m.perspective))?,
            definition: m.definition,
            weight: m.weight,
            unit: UnitOfMeasure::from_code(&m.unit).ok_or_else(|| corrupt("unit", &m.unit))?,
            category: KpiCategory::from_code(&m.category)
                .ok_or_else(|| corrupt("category", &m.category))?,
            ytd_calculation: YtdCalculation::from_code(&m.ytd_calculation)
                .ok_or_else(|| corrupt("ytd_calculation", &m.ytd_calculation))?,
            targets: values_from_json("targets_json", &m.targets_json)?,
            actuals: values_from_json("actuals_json", &m.actuals_json)?,
            problem: m.problem,
            corrective_action: m.corrective_action,
        })
    }
}

fn to_active_model(kpi: &Kpi) -> Result<kpi::ActiveModel, DbErr> {
    Ok(kpi::ActiveModel {
        id: Set(kpi.base.id.as_string()),
        code: Set(kpi.base.code.clone()),
        description: Set(kpi.base.description.clone()),
        comment: Set(kpi.base.comment.clone()),
        perspective: Set(kpi.perspective.code().to_string()),
        definition: Set(kpi.definition.clone()),
        weight: Set(kpi.weight),
        unit: Set(kpi.unit.code().to_string()),
        category: Set(kpi.category.code().to_string()),
        ytd_calculation: Set(kpi.ytd_calculation.code().to_string()),
        targets_json: Set(values_to_json(&kpi.targets)?),
        actuals_json: Set(values_to_json(&kpi.actuals)?),
        problem: Set(kpi.problem.clone()),
        corrective_action: Set(kpi.corrective_action.clone()),
        is_deleted: Set(kpi.base.metadata.is_deleted),
        created_at: Set(Some(kpi.base.metadata.created_at)),
        updated_at: Set(Some(kpi.base.metadata.updated_at)),
        version: Set(kpi.base.metadata.version),
    })
}

// ============================================================================
// Repository functions
// ============================================================================

/// Все KPI, упорядоченные по номеру
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Kpi>, DbErr> {
    let models = kpi::Entity::find()
        .filter(kpi::Column::IsDeleted.eq(false))
        .order_by_asc(kpi::Column::Code)
        .all(db)
        .await?;
    models.into_iter().map(Kpi::try_from).collect()
}

pub async fn list_by_perspective(
    db: &DatabaseConnection,
    perspective: Perspective,
) -> Result<Vec<Kpi>, DbErr> {
    let models = kpi::Entity::find()
        .filter(kpi::Column::IsDeleted.eq(false))
        .filter(kpi::Column::Perspective.eq(perspective.code()))
        .order_by_asc(kpi::Column::Code)
        .all(db)
        .await?;
    models.into_iter().map(Kpi::try_from).collect()
}

pub async fn find_by_id(db: &DatabaseConnection, id: &KpiId) -> Result<Option<Kpi>, DbErr> {
    let model = kpi::Entity::find_by_id(id.as_string())
        .filter(kpi::Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(Kpi::try_from).transpose()
}

pub async fn find_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<Kpi>, DbErr> {
    let model = kpi::Entity::find()
        .filter(kpi::Column::IsDeleted.eq(false))
        .filter(kpi::Column::Code.eq(code))
        .one(db)
        .await?;
    model.map(Kpi::try_from).transpose()
}

pub async fn insert(db: &DatabaseConnection, kpi: &Kpi) -> Result<(), DbErr> {
    let mut active_model = to_active_model(kpi)?;
    active_model.version = Set(1);
    active_model.insert(db).await?;
    Ok(())
}

/// Обновить KPI; версия увеличивается на 1
pub async fn update(db: &DatabaseConnection, kpi: &Kpi) -> Result<(), DbErr> {
    let mut active_model = to_active_model(kpi)?;
    active_model.updated_at = Set(Some(Utc::now()));
    active_model.version = Set(kpi.base.metadata.version + 1);
    kpi::Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn soft_delete(db: &DatabaseConnection, id: &KpiId) -> Result<bool, DbErr> {
    let result = kpi::Entity::update_many()
        .col_expr(kpi::Column::IsDeleted, Expr::value(true))
        .col_expr(kpi::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(kpi::Column::Id.eq(id.as_string()))
        .filter(kpi::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;

    fn sample(code: &str, perspective: Perspective) -> Kpi {
        let mut kpi = Kpi::new_for_insert(
            code.into(),
            format!("KPI {}", code),
            perspective,
            25.0,
            UnitOfMeasure::Percent,
            KpiCategory::Max,
            YtdCalculation::Average,
        );
        kpi.targets.insert("2025-01".into(), 95.0);
        kpi.actuals.insert("2025-01".into(), 97.5);
        kpi.problem = Some("none".into());
        kpi
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let db = memory_db().await;
        let kpi = sample("F1.1", Perspective::Financial);
        insert(&db, &kpi).await.unwrap();

        let loaded = find_by_id(&db, &kpi.base.id).await.unwrap().unwrap();
        assert_eq!(loaded.base.code, "F1.1");
        assert_eq!(loaded.perspective, Perspective::Financial);
        assert_eq!(loaded.targets, kpi.targets);
        assert_eq!(loaded.actual_at("2025-01"), Some(97.5));
        assert_eq!(loaded.problem.as_deref(), Some("none"));
        assert_eq!(loaded.base.metadata.version, 1);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let db = memory_db().await;
        let mut kpi = sample("C1.1", Perspective::Customer);
        insert(&db, &kpi).await.unwrap();

        kpi = find_by_id(&db, &kpi.base.id).await.unwrap().unwrap();
        kpi.set_actual("2025-02", Some(90.0)).unwrap();
        update(&db, &kpi).await.unwrap();

        let loaded = find_by_id(&db, &kpi.base.id).await.unwrap().unwrap();
        assert_eq!(loaded.actual_at("2025-02"), Some(90.0));
        assert_eq!(loaded.base.metadata.version, 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_record() {
        let db = memory_db().await;
        let a = sample("F1.2", Perspective::Financial);
        let b = sample("LG1.1", Perspective::LearningGrowth);
        insert(&db, &a).await.unwrap();
        insert(&db, &b).await.unwrap();

        assert!(soft_delete(&db, &a.base.id).await.unwrap());
        assert!(!soft_delete(&db, &a.base.id).await.unwrap());

        let all = list_all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].base.code, "LG1.1");
        assert!(find_by_id(&db, &a.base.id).await.unwrap().is_none());
        assert!(find_by_code(&db, "LG1.1").await.unwrap().is_some());
        assert_eq!(
            list_by_perspective(&db, Perspective::Financial).await.unwrap().len(),
            0
        );
    }
}
