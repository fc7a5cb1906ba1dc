use contracts::system::auth::Role;
use contracts::system::users::CreateUserDto;
use sea_orm::DatabaseConnection;

use crate::system::users::{repository, service};

/// Создаёт администратора по умолчанию, если пользователей ещё нет
pub async fn ensure_admin_user_exists(db: &DatabaseConnection) -> anyhow::Result<()> {
    if repository::count_users(db).await? > 0 {
        return Ok(());
    }

    tracing::info!("No users found. Creating default admin user...");
    let admin_dto = CreateUserDto {
        username: "admin".to_string(),
        password: "admin".to_string(),
        email: None,
        full_name: Some("Administrator".to_string()),
        role: Role::Admin,
    };
    let admin_id = service::create(db, admin_dto, None).await?;

    tracing::warn!("Default admin user created (id {}): admin/admin", admin_id);
    tracing::warn!("Change the default password immediately");
    Ok(())
}
