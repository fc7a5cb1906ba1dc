use chrono::Utc;
use contracts::domain::a005_employee::{Employee, EmployeeId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::system::auth::Role;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

mod employee {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a005_employee")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub position: String,
        pub team: String,
        pub email: Option<String>,
        pub role: String,
        pub manager_ref: Option<String>,
        pub is_active: bool,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use employee::{ActiveModel, Column, Entity, Model};

impl TryFrom<Model> for Employee {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let id = EmployeeId::from_string(&m.id).map_err(DbErr::Custom)?;
        let role = Role::from_code(&m.role)
            .ok_or_else(|| DbErr::Custom(format!("a005_employee: unexpected role '{}'", m.role)))?;

        Ok(Employee {
            base: BaseAggregate::with_metadata(id, m.code, m.description, m.comment, metadata),
            position: m.position,
            team: m.team,
            email: m.email,
            role,
            manager_ref: m.manager_ref,
            is_active: m.is_active,
        })
    }
}

fn to_active_model(employee: &Employee) -> ActiveModel {
    ActiveModel {
        id: Set(employee.base.id.as_string()),
        code: Set(employee.base.code.clone()),
        description: Set(employee.base.description.clone()),
        comment: Set(employee.base.comment.clone()),
        position: Set(employee.position.clone()),
        team: Set(employee.team.clone()),
        email: Set(employee.email.clone()),
        role: Set(employee.role.code().to_string()),
        manager_ref: Set(employee.manager_ref.clone()),
        is_active: Set(employee.is_active),
        is_deleted: Set(employee.base.metadata.is_deleted),
        created_at: Set(Some(employee.base.metadata.created_at)),
        updated_at: Set(Some(employee.base.metadata.updated_at)),
        version: Set(employee.base.metadata.version),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Employee>, DbErr> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Description)
        .all(db)
        .await?;
    models.into_iter().map(Employee::try_from).collect()
}

pub async fn find_by_id(db: &DatabaseConnection, id: &EmployeeId) -> Result<Option<Employee>, DbErr> {
    let model = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(Employee::try_from).transpose()
}

/// Поиск по табельному номеру
pub async fn find_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<Employee>, DbErr> {
    let model = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Code.eq(code))
        .one(db)
        .await?;
    model.map(Employee::try_from).transpose()
}

pub async fn insert(db: &DatabaseConnection, employee: &Employee) -> Result<(), DbErr> {
    let mut active_model = to_active_model(employee);
    active_model.version = Set(1);
    active_model.insert(db).await?;
    Ok(())
}

pub async fn update(db: &DatabaseConnection, employee: &Employee) -> Result<(), DbErr> {
    let mut active_model = to_active_model(employee);
    active_model.updated_at = Set(Some(Utc::now()));
    active_model.version = Set(employee.base.metadata.version + 1);
    Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn soft_delete(db: &DatabaseConnection, id: &EmployeeId) -> Result<bool, DbErr> {
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
    async fn test_roundtrip_keeps_role() {
        let db = memory_db().await;
        let mut employee = Employee::new_for_insert(
            "E-001".into(),
            "Maria Santos".into(),
            "Sales Manager".into(),
            "North".into(),
            Role::Manager,
        );
        employee.email = Some("maria@example.com".into());
        insert(&db, &employee).await.unwrap();

        let loaded = find_by_code(&db, "E-001").await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Manager);
        assert_eq!(loaded.email.as_deref(), Some("maria@example.com"));
        assert!(loaded.is_active);

        assert!(soft_delete(&db, &employee.base.id).await.unwrap());
        assert!(find_by_id(&db, &employee.base.id).await.unwrap().is_none());
    }
}
