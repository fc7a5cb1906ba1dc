//! Хранилище отчётных периодов
//!
//! Функции принимают любое `ConnectionTrait`, чтобы смена статуса могла
//! выполняться целиком внутри одной транзакции.

use chrono::{NaiveDate, Utc};
use contracts::domain::a004_period::{Period, PeriodId, PeriodStatus, PeriodType};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

mod period {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a004_period")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub year: i32,
        pub sub_period: String,
        pub period_type: String,
        pub date_from: chrono::NaiveDate,
        pub date_to: chrono::NaiveDate,
        pub status: String,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use period::{ActiveModel, Column, Entity, Model};

impl TryFrom<Model> for Period {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let id = PeriodId::from_string(&m.id).map_err(DbErr::Custom)?;
        let period_type = PeriodType::from_code(&m.period_type).ok_or_else(|| {
            DbErr::Custom(format!("a004_period: unexpected period_type '{}'", m.period_type))
        })?;
        let status = PeriodStatus::from_code(&m.status)
            .ok_or_else(|| DbErr::Custom(format!("a004_period: unexpected status '{}'", m.status)))?;

        Ok(Period {
            base: BaseAggregate::with_metadata(id, m.code, m.description, m.comment, metadata),
            year: m.year,
            sub_period: m.sub_period,
            period_type,
            date_from: m.date_from,
            date_to: m.date_to,
            status,
        })
    }
}

fn to_active_model(period: &Period) -> ActiveModel {
    ActiveModel {
        id: Set(period.base.id.as_string()),
        code: Set(period.base.code.clone()),
        description: Set(period.base.description.clone()),
        comment: Set(period.base.comment.clone()),
        year: Set(period.year),
        sub_period: Set(period.sub_period.clone()),
        period_type: Set(period.period_type.code().to_string()),
        date_from: Set(period.date_from),
        date_to: Set(period.date_to),
        status: Set(period.status.code().to_string()),
        is_deleted: Set(period.base.metadata.is_deleted),
        created_at: Set(Some(period.base.metadata.created_at)),
        updated_at: Set(Some(period.base.metadata.updated_at)),
        version: Set(period.base.metadata.version),
    }
}

/// Периоды по дате начала
pub async fn list_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Period>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::DateFrom)
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    models.into_iter().map(Period::try_from).collect()
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: &PeriodId) -> Result<Option<Period>, DbErr> {
    let model = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(Period::try_from).transpose()
}

pub async fn find_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<Period>, DbErr> {
    let model = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Code.eq(code))
        .one(db)
        .await?;
    model.map(Period::try_from).transpose()
}

/// Текущий активный период (не более одного)
pub async fn find_active<C: ConnectionTrait>(db: &C) -> Result<Option<Period>, DbErr> {
    let model = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Status.eq(PeriodStatus::Active.code()))
        .one(db)
        .await?;
    model.map(Period::try_from).transpose()
}

/// Периоды, пересекающиеся с интервалом дат
pub async fn list_overlapping<C: ConnectionTrait>(
    db: &C,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<Period>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::DateFrom.lte(date_to))
        .filter(Column::DateTo.gte(date_from))
        .order_by_asc(Column::DateFrom)
        .all(db)
        .await?;
    models.into_iter().map(Period::try_from).collect()
}

pub async fn insert<C: ConnectionTrait>(db: &C, period: &Period) -> Result<(), DbErr> {
    let mut active_model = to_active_model(period);
    active_model.version = Set(1);
    active_model.insert(db).await?;
    Ok(())
}

pub async fn update<C: ConnectionTrait>(db: &C, period: &Period) -> Result<(), DbErr> {
    let mut active_model = to_active_model(period);
    active_model.updated_at = Set(Some(Utc::now()));
    active_model.version = Set(period.base.metadata.version + 1);
    Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, id: &PeriodId) -> Result<bool, DbErr> {
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

    fn quarter(code: &str, q: u32) -> Period {
        let start_month = (q - 1) * 3 + 1;
        let from = NaiveDate::from_ymd_opt(2025, start_month, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, start_month + 2, 28).unwrap();
        Period::new_for_insert(
            code.into(),
            format!("FY2025 Q{}", q),
            2025,
            format!("Q{}", q),
            PeriodType::Quarterly,
            from,
            to,
        )
    }

    #[tokio::test]
    async fn test_roundtrip_dates_and_status() {
        let db = memory_db().await;
        let mut q1 = quarter("2025-Q1", 1);
        insert(&db, &q1).await.unwrap();
        insert(&db, &quarter("2025-Q2", 2)).await.unwrap();

        q1 = find_by_id(&db, &q1.base.id).await.unwrap().unwrap();
        assert_eq!(q1.date_from, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(q1.status, PeriodStatus::Draft);
        assert!(find_active(&db).await.unwrap().is_none());

        q1.status = PeriodStatus::Active;
        update(&db, &q1).await.unwrap();
        let active = find_active(&db).await.unwrap().unwrap();
        assert_eq!(active.base.code, "2025-Q1");
        assert_eq!(active.base.metadata.version, 2);

        let feb = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        assert_eq!(list_overlapping(&db, feb, feb).await.unwrap().len(), 1);
        assert_eq!(list_all(&db).await.unwrap().len(), 2);
        assert!(find_by_code(&db, "2025-Q2").await.unwrap().is_some());
    }
}
