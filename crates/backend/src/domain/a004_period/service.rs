use super::repository;
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::{sanitize_opt, sanitize_plain};
use contracts::domain::a004_period::{check_transition, Period, PeriodDto, PeriodId, PeriodStatus};
use contracts::domain::common::AggregateId;
use sea_orm::{DatabaseConnection, TransactionTrait};

pub fn parse_id(id: &str) -> ServiceResult<PeriodId> {
    PeriodId::from_string(id).map_err(ServiceError::Validation)
}

fn sanitize_dto(dto: PeriodDto) -> PeriodDto {
    // Код по умолчанию: год и подпериод ("2025-Q1")
    let code = dto
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", dto.year, dto.sub_period.trim()));
    PeriodDto {
        code: Some(code),
        description: sanitize_plain(&dto.description),
        sub_period: sanitize_plain(&dto.sub_period),
        comment: sanitize_opt(dto.comment),
        ..dto
    }
}

async fn ensure_code_is_free(
    db: &DatabaseConnection,
    code: &str,
    own_id: Option<PeriodId>,
) -> ServiceResult<()> {
    if let Some(existing) = repository::find_by_code(db, code).await? {
        if Some(existing.base.id) != own_id {
            return Err(ServiceError::Conflict(format!("Period {} already exists", code)));
        }
    }
    Ok(())
}

/// Новый период всегда создаётся в статусе Draft
pub async fn create(db: &DatabaseConnection, dto: PeriodDto) -> ServiceResult<PeriodId> {
    let dto = sanitize_dto(dto);
    let mut period = Period::new_for_insert(
        dto.code.clone().unwrap_or_default(),
        dto.description.clone(),
        dto.year,
        dto.sub_period.clone(),
        dto.period_type,
        dto.date_from,
        dto.date_to,
    );
    period.update(&dto);
    period.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &period.base.code, None).await?;

    period.before_write();
    repository::insert(db, &period).await?;
    tracing::info!("Created period {} ({} .. {})", period.base.code, period.date_from, period.date_to);
    Ok(period.base.id)
}

pub async fn update(db: &DatabaseConnection, dto: PeriodDto) -> ServiceResult<PeriodId> {
    let id_str = dto
        .id
        .clone()
        .ok_or_else(|| ServiceError::Validation("ID is required for update".into()))?;
    let mut period = get_by_id(db, &id_str).await?;
    if period.status == PeriodStatus::Closed {
        return Err(ServiceError::Conflict(format!(
            "Period {} is closed and cannot be edited",
            period.base.code
        )));
    }

    let dto = sanitize_dto(dto);
    period.update(&dto);
    period.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &period.base.code, Some(period.base.id)).await?;

    period.before_write();
    repository::update(db, &period).await?;
    Ok(period.base.id)
}

pub async fn upsert(db: &DatabaseConnection, dto: PeriodDto) -> ServiceResult<PeriodId> {
    if dto.id.is_some() {
        update(db, dto).await
    } else {
        create(db, dto).await
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<Period> {
    let period_id = parse_id(id)?;
    repository::find_by_id(db, &period_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Period {}", id)))
}

/// Активный период удалить нельзя
pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    let period = get_by_id(db, id).await?;
    if period.status == PeriodStatus::Active {
        return Err(ServiceError::Conflict(format!(
            "Period {} is active and cannot be deleted",
            period.base.code
        )));
    }
    repository::soft_delete(db, &period.base.id).await?;
    tracing::info!("Deleted period {}", period.base.code);
    Ok(())
}

pub async fn list_all(db: &DatabaseConnection) -> ServiceResult<Vec<Period>> {
    Ok(repository::list_all(db).await?)
}

pub async fn active_period(db: &DatabaseConnection) -> ServiceResult<Option<Period>> {
    Ok(repository::find_active(db).await?)
}

/// Смена статуса периода
///
/// Проверка единственности активного периода и запись выполняются в одной
/// транзакции.
pub async fn transition(db: &DatabaseConnection, id: &str, to: PeriodStatus) -> ServiceResult<Period> {
    let period_id = parse_id(id)?;
    let txn = db.begin().await?;

    let periods = repository::list_all(&txn).await?;
    let index = check_transition(&periods, period_id, to)?;
    let mut period = periods[index].clone();
    let from = period.status;
    period.status = to;
    period.before_write();
    repository::update(&txn, &period).await?;

    txn.commit().await?;
    tracing::info!(
        "Period {} moved from {} to {}",
        period.base.code,
        from.code(),
        to.code()
    );
    get_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;
    use chrono::NaiveDate;
    use contracts::domain::a004_period::PeriodType;

    fn month(m: u32) -> PeriodDto {
        PeriodDto {
            id: None,
            code: None,
            description: format!("FY2025 M{:02}", m),
            year: 2025,
            sub_period: format!("M{:02}", m),
            period_type: PeriodType::Monthly,
            date_from: NaiveDate::from_ymd_opt(2025, m, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, m, 28).unwrap(),
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_code_and_rejects_bad_dates() {
        let db = memory_db().await;
        let id = create(&db, month(1)).await.unwrap();
        let period = get_by_id(&db, &id.as_string()).await.unwrap();
        assert_eq!(period.base.code, "2025-M01");
        assert_eq!(period.status, PeriodStatus::Draft);

        let err = create(&db, month(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let mut bad = month(2);
        bad.date_to = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = create(&db, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_one_active_period() {
        let db = memory_db().await;
        let jan = create(&db, month(1)).await.unwrap().as_string();
        let feb = create(&db, month(2)).await.unwrap().as_string();

        let active = transition(&db, &jan, PeriodStatus::Active).await.unwrap();
        assert_eq!(active.status, PeriodStatus::Active);

        let err = transition(&db, &feb, PeriodStatus::Active).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = delete(&db, &jan).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        transition(&db, &jan, PeriodStatus::Closed).await.unwrap();
        transition(&db, &feb, PeriodStatus::Active).await.unwrap();
        let current = active_period(&db).await.unwrap().unwrap();
        assert_eq!(current.base.code, "2025-M02");

        let err = transition(&db, &jan, PeriodStatus::Active).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_transition_of_unknown_period() {
        let db = memory_db().await;
        let err = transition(&db, &PeriodId::new_v4().as_string(), PeriodStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
