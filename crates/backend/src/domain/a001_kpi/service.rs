use super::repository;
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::{sanitize_opt, sanitize_plain};
use contracts::domain::a001_kpi::{ActualEntryDto, Kpi, KpiDto, KpiId, KpiNotesDto};
use contracts::domain::common::AggregateId;
use contracts::enums::{KpiCategory, PerformanceStatus, Perspective};
use contracts::shared::list_query::{Filterable, ListState, Page};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

use crate::dashboards::d100_bsc_scorecard::service::resolve_period;
use crate::shared::config::achievement_policy;

pub fn parse_id(id: &str) -> ServiceResult<KpiId> {
    KpiId::from_string(id).map_err(ServiceError::Validation)
}

/// Очистка свободного текста из формы
fn sanitize_dto(dto: KpiDto) -> KpiDto {
    KpiDto {
        code: dto.code.trim().to_string(),
        description: sanitize_plain(&dto.description),
        definition: sanitize_opt(dto.definition),
        problem: sanitize_opt(dto.problem),
        corrective_action: sanitize_opt(dto.corrective_action),
        comment: sanitize_opt(dto.comment),
        ..dto
    }
}

async fn ensure_code_is_free(
    db: &DatabaseConnection,
    code: &str,
    own_id: Option<KpiId>,
) -> ServiceResult<()> {
    if let Some(existing) = repository::find_by_code(db, code).await? {
        if Some(existing.base.id) != own_id {
            return Err(ServiceError::Conflict(format!("KPI number {} already exists", code)));
        }
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, dto: KpiDto) -> ServiceResult<KpiId> {
    let dto = sanitize_dto(dto);
    let mut kpi = Kpi::new_for_insert(
        dto.code.clone(),
        dto.description.clone(),
        dto.perspective,
        dto.weight,
        dto.unit,
        dto.category,
        dto.ytd_calculation,
    );
    kpi.update(&dto);
    kpi.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &kpi.base.code, None).await?;

    kpi.before_write();
    repository::insert(db, &kpi).await?;
    tracing::info!("Created KPI {} ({})", kpi.base.code, kpi.base.id);
    Ok(kpi.base.id)
}

pub async fn update(db: &DatabaseConnection, dto: KpiDto) -> ServiceResult<KpiId> {
    let id_str = dto
        .id
        .clone()
        .ok_or_else(|| ServiceError::Validation("ID is required for update".into()))?;
    let id = parse_id(&id_str)?;
    let mut kpi = get_by_id(db, &id_str).await?;

    let dto = sanitize_dto(dto);
    kpi.update(&dto);
    kpi.validate().map_err(ServiceError::Validation)?;
    ensure_code_is_free(db, &kpi.base.code, Some(id)).await?;

    kpi.before_write();
    repository::update(db, &kpi).await?;
    tracing::info!("Updated KPI {} ({})", kpi.base.code, kpi.base.id);
    Ok(id)
}

/// Создание или обновление в зависимости от наличия `id`
pub async fn upsert(db: &DatabaseConnection, dto: KpiDto) -> ServiceResult<KpiId> {
    if dto.id.is_some() {
        update(db, dto).await
    } else {
        create(db, dto).await
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<Kpi> {
    let kpi_id = parse_id(id)?;
    repository::find_by_id(db, &kpi_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("KPI {}", id)))
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    let kpi_id = parse_id(id)?;
    if !repository::soft_delete(db, &kpi_id).await? {
        return Err(ServiceError::not_found(format!("KPI {}", id)));
    }
    tracing::info!("Deleted KPI {}", id);
    Ok(())
}

pub async fn list_all(db: &DatabaseConnection) -> ServiceResult<Vec<Kpi>> {
    Ok(repository::list_all(db).await?)
}

/// KPI со статусом выполнения за выбранный месяц
#[derive(Clone)]
struct KpiAtPeriod {
    kpi: Kpi,
    status: PerformanceStatus,
}

impl Filterable for KpiAtPeriod {
    fn search_fields(&self) -> Vec<&str> {
        self.kpi.search_fields()
    }

    fn perspective(&self) -> Option<Perspective> {
        self.kpi.perspective()
    }

    fn category(&self) -> Option<KpiCategory> {
        self.kpi.category()
    }

    fn status(&self) -> Option<PerformanceStatus> {
        Some(self.status)
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.kpi.reference_date()
    }
}

/// Список с фильтром и пагинацией
///
/// Статус KPI считается за месяц `period`; без него берётся тот же месяц,
/// что и в BSC scorecard.
pub async fn list(
    db: &DatabaseConnection,
    state: &ListState,
    period: Option<&str>,
) -> ServiceResult<Page<Kpi>> {
    let all = repository::list_all(db).await?;
    if state.filter().status.is_none() {
        return Ok(state.apply(&all));
    }

    let period = resolve_period(db, period, &all).await?;
    let policy = achievement_policy();
    let rows: Vec<KpiAtPeriod> = all
        .into_iter()
        .map(|kpi| {
            let status = kpi.score_row(&period, policy).status;
            KpiAtPeriod { kpi, status }
        })
        .collect();

    let page = state.apply(&rows);
    Ok(Page {
        items: page.items.into_iter().map(|row| row.kpi).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    })
}

/// Ввод факта за месяц
pub async fn enter_actual(
    db: &DatabaseConnection,
    id: &str,
    entry: ActualEntryDto,
) -> ServiceResult<Kpi> {
    let mut kpi = get_by_id(db, id).await?;
    kpi.set_actual(&entry.period, entry.actual)
        .map_err(ServiceError::Validation)?;
    kpi.before_write();
    repository::update(db, &kpi).await?;
    tracing::info!(
        "Actual for KPI {} at {} set to {:?}",
        kpi.base.code,
        entry.period,
        entry.actual
    );
    get_by_id(db, id).await
}

/// Проблема и корректирующее действие
pub async fn update_notes(
    db: &DatabaseConnection,
    id: &str,
    notes: KpiNotesDto,
) -> ServiceResult<Kpi> {
    let mut kpi = get_by_id(db, id).await?;
    kpi.set_notes(&KpiNotesDto {
        problem: sanitize_opt(notes.problem),
        corrective_action: sanitize_opt(notes.corrective_action),
    });
    kpi.before_write();
    repository::update(db, &kpi).await?;
    get_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;
    use contracts::enums::{KpiCategory, Perspective, UnitOfMeasure, YtdCalculation};
    use contracts::shared::list_query::ListFilter;
    use std::collections::BTreeMap;

    fn dto(code: &str, weight: f64) -> KpiDto {
        KpiDto {
            id: None,
            code: code.into(),
            description: format!("Indicator {}", code),
            perspective: Perspective::Financial,
            definition: Some("<i>Revenue</i> / plan".into()),
            weight,
            unit: UnitOfMeasure::Currency,
            category: KpiCategory::Max,
            ytd_calculation: YtdCalculation::Accumulative,
            targets: BTreeMap::from([("2025-01".to_string(), 10.0)]),
            actuals: None,
            problem: None,
            corrective_action: None,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_rejects_duplicates() {
        let db = memory_db().await;
        let id = create(&db, dto("F1.1", 40.0)).await.unwrap();
        let kpi = get_by_id(&db, &id.as_string()).await.unwrap();
        assert_eq!(kpi.definition, "Revenue / plan");

        let err = create(&db, dto("F1.1", 10.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_weight_is_rejected() {
        let db = memory_db().await;
        let err = create(&db, dto("F1.2", 150.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_enter_actual_and_notes() {
        let db = memory_db().await;
        let id = create(&db, dto("F1.3", 15.0)).await.unwrap().as_string();

        let kpi = enter_actual(
            &db,
            &id,
            ActualEntryDto {
                period: "2025-01".into(),
                actual: Some(9.0),
            },
        )
        .await
        .unwrap();
        assert_eq!(kpi.actual_at("2025-01"), Some(9.0));

        let err = enter_actual(
            &db,
            &id,
            ActualEntryDto {
                period: "2025/01".into(),
                actual: Some(1.0),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let kpi = update_notes(
            &db,
            &id,
            KpiNotesDto {
                problem: Some("Late invoices".into()),
                corrective_action: Some("Weekly follow-up".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(kpi.problem.as_deref(), Some("Late invoices"));
        assert_eq!(kpi.actual_at("2025-01"), Some(9.0));
    }

    #[tokio::test]
    async fn test_update_keeps_actuals_and_list_filters() {
        let db = memory_db().await;
        let id = create(&db, dto("F2.1", 20.0)).await.unwrap().as_string();
        create(&db, dto("F2.2", 20.0)).await.unwrap();
        enter_actual(
            &db,
            &id,
            ActualEntryDto {
                period: "2025-01".into(),
                actual: Some(12.0),
            },
        )
        .await
        .unwrap();

        let mut changed = dto("F2.1", 25.0);
        changed.id = Some(id.clone());
        upsert(&db, changed).await.unwrap();
        let kpi = get_by_id(&db, &id).await.unwrap();
        assert_eq!(kpi.weight, 25.0);
        assert_eq!(kpi.actual_at("2025-01"), Some(12.0));

        let mut state = ListState::new(10);
        state.set_filter(ListFilter {
            search: Some("f2.2".into()),
            ..Default::default()
        });
        let page = list(&db, &state, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].base.code, "F2.2");
    }

    #[tokio::test]
    async fn test_list_filters_by_status_for_period() {
        let db = memory_db().await;
        for (code, actual) in [("F3.1", 12.0), ("F3.2", 5.0), ("F3.3", 11.0)] {
            let id = create(&db, dto(code, 10.0)).await.unwrap().as_string();
            enter_actual(
                &db,
                &id,
                ActualEntryDto {
                    period: "2025-01".into(),
                    actual: Some(actual),
                },
            )
            .await
            .unwrap();
        }

        let mut state = ListState::new(10);
        state.set_filter(ListFilter {
            status: Some(PerformanceStatus::OnTrack),
            ..Default::default()
        });
        let page = list(&db, &state, Some("2025-01")).await.unwrap();
        let codes: Vec<_> = page.items.iter().map(|k| k.base.code.as_str()).collect();
        assert_eq!(page.total, 2);
        assert!(codes.contains(&"F3.1") && codes.contains(&"F3.3"));

        // без месяца: последний месяц с целью, здесь тот же 2025-01
        state.set_filter(ListFilter {
            status: Some(PerformanceStatus::OffTrack),
            ..Default::default()
        });
        let page = list(&db, &state, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].base.code, "F3.2");

        // в месяце без фактов все KPI вне плана
        let page = list(&db, &state, Some("2025-02")).await.unwrap();
        assert_eq!(page.total, 3);

        let err = list(&db, &state, Some("Jan")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ids() {
        let db = memory_db().await;
        let err = get_by_id(&db, "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = delete(&db, &KpiId::new_v4().as_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
