//! Демонстрационные данные: KPI по четырём перспективам, планы команд,
//! исполнители, сотрудники и активный годовой период.

use chrono::{Datelike, NaiveDate, Utc};
use contracts::domain::a001_kpi::{KpiDto, PeriodValues};
use contracts::domain::a002_team_action_plan::TeamActionPlanDto;
use contracts::domain::a003_individual_performance::IndividualPerformanceDto;
use contracts::domain::a004_period::{PeriodDto, PeriodStatus, PeriodType};
use contracts::domain::a005_employee::EmployeeDto;
use contracts::domain::common::AggregateId;
use contracts::enums::{KpiCategory, Perspective, UnitOfMeasure, YtdCalculation};
use contracts::system::auth::Role;
use sea_orm::DatabaseConnection;

use crate::domain::{a001_kpi, a002_team_action_plan, a003_individual_performance, a004_period, a005_employee};
use crate::shared::error::{ServiceError, ServiceResult};

/// Месяцы с введёнными фактами
const MONTHS_WITH_ACTUALS: u32 = 3;

struct KpiSeed {
    code: &'static str,
    name: &'static str,
    perspective: Perspective,
    weight: f64,
    unit: UnitOfMeasure,
    category: KpiCategory,
    ytd: YtdCalculation,
    target: f64,
    actual: f64,
}

const KPIS: [KpiSeed; 8] = [
    KpiSeed {
        code: "F1.1",
        name: "Revenue",
        perspective: Perspective::Financial,
        weight: 20.0,
        unit: UnitOfMeasure::Currency,
        category: KpiCategory::Max,
        ytd: YtdCalculation::Accumulative,
        target: 100_000.0,
        actual: 95_000.0,
    },
    KpiSeed {
        code: "F1.2",
        name: "Operating cost ratio",
        perspective: Perspective::Financial,
        weight: 10.0,
        unit: UnitOfMeasure::Percent,
        category: KpiCategory::Min,
        ytd: YtdCalculation::Average,
        target: 30.0,
        actual: 32.0,
    },
    KpiSeed {
        code: "C1.1",
        name: "Customer satisfaction",
        perspective: Perspective::Customer,
        weight: 15.0,
        unit: UnitOfMeasure::Score,
        category: KpiCategory::Max,
        ytd: YtdCalculation::Average,
        target: 5.0,
        actual: 4.5,
    },
    KpiSeed {
        code: "C1.2",
        name: "Complaint resolution time",
        perspective: Perspective::Customer,
        weight: 10.0,
        unit: UnitOfMeasure::Days,
        category: KpiCategory::Min,
        ytd: YtdCalculation::Average,
        target: 3.0,
        actual: 2.5,
    },
    KpiSeed {
        code: "I1.1",
        name: "On-time delivery",
        perspective: Perspective::InternalBusinessProcess,
        weight: 15.0,
        unit: UnitOfMeasure::Percent,
        category: KpiCategory::Max,
        ytd: YtdCalculation::Average,
        target: 95.0,
        actual: 91.0,
    },
    KpiSeed {
        code: "I1.2",
        name: "Defect rate",
        perspective: Perspective::InternalBusinessProcess,
        weight: 10.0,
        unit: UnitOfMeasure::Percent,
        category: KpiCategory::Min,
        ytd: YtdCalculation::Average,
        target: 2.0,
        actual: 2.4,
    },
    KpiSeed {
        code: "L1.1",
        name: "Training hours per employee",
        perspective: Perspective::LearningGrowth,
        weight: 10.0,
        unit: UnitOfMeasure::Number,
        category: KpiCategory::Max,
        ytd: YtdCalculation::Accumulative,
        target: 8.0,
        actual: 10.0,
    },
    KpiSeed {
        code: "L1.2",
        name: "Employee engagement",
        perspective: Perspective::LearningGrowth,
        weight: 10.0,
        unit: UnitOfMeasure::Score,
        category: KpiCategory::OnTarget,
        ytd: YtdCalculation::LastValue,
        target: 4.0,
        actual: 3.6,
    },
];

fn monthly(year: i32, months: u32, value: f64) -> PeriodValues {
    (1..=months)
        .map(|m| (format!("{:04}-{:02}", year, m), value))
        .collect()
}

fn date(year: i32, month: u32, day: u32) -> ServiceResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ServiceError::Validation(format!("Invalid date {}-{}-{}", year, month, day)))
}

/// Заполнить БД демонстрационными данными, если KPI ещё нет
///
/// Возвращает `false`, если данные уже были.
pub async fn seed_if_empty(db: &DatabaseConnection) -> ServiceResult<bool> {
    if !a001_kpi::service::list_all(db).await?.is_empty() {
        tracing::info!("Demo data skipped: KPIs already exist");
        return Ok(false);
    }

    let year = Utc::now().year();

    // Сотрудники
    let director = a005_employee::service::create(
        db,
        employee("E001", "Diana Director", "Director", "Management", Role::Director, None),
    )
    .await?
    .as_string();
    let manager = a005_employee::service::create(
        db,
        employee("E002", "Mark Manager", "Service manager", "Customer Service", Role::Manager, Some(director)),
    )
    .await?
    .as_string();
    let supervisor = a005_employee::service::create(
        db,
        employee("E003", "Sam Supervisor", "Shift supervisor", "Customer Service", Role::Supervisor, Some(manager.clone())),
    )
    .await?
    .as_string();
    let agent = a005_employee::service::create(
        db,
        employee("E004", "Alex Agent", "Support agent", "Customer Service", Role::Staff, Some(supervisor.clone())),
    )
    .await?
    .as_string();

    // Годовой период
    let period_id = a004_period::service::create(
        db,
        PeriodDto {
            id: None,
            code: None,
            description: format!("Fiscal year {}", year),
            year,
            sub_period: "FY".into(),
            period_type: PeriodType::Annual,
            date_from: date(year, 1, 1)?,
            date_to: date(year, 12, 31)?,
            comment: None,
        },
    )
    .await?
    .as_string();
    a004_period::service::transition(db, &period_id, PeriodStatus::Active).await?;

    // KPI
    let mut customer_kpi = None;
    for seed in &KPIS {
        let id = a001_kpi::service::create(
            db,
            KpiDto {
                id: None,
                code: seed.code.into(),
                description: seed.name.into(),
                perspective: seed.perspective,
                definition: None,
                weight: seed.weight,
                unit: seed.unit,
                category: seed.category,
                ytd_calculation: seed.ytd,
                targets: monthly(year, 12, seed.target),
                actuals: Some(monthly(year, MONTHS_WITH_ACTUALS, seed.actual)),
                problem: None,
                corrective_action: None,
                comment: None,
            },
        )
        .await?
        .as_string();
        if seed.code == "C1.1" {
            customer_kpi = Some(id);
        }
    }
    let customer_kpi = customer_kpi
        .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Customer KPI was not seeded")))?;

    // Каскад для C1.1: две команды, исполнители у Customer Service
    let service_plan = a002_team_action_plan::service::create(
        db,
        team_plan(&customer_kpi, "Customer Service", 10.0, monthly(year, 12, 5.0)),
    )
    .await?
    .as_string();
    a002_team_action_plan::service::create(db, team_plan(&customer_kpi, "Sales", 5.0, PeriodValues::new())).await?;

    for (employee_ref, name, position, weight, actual) in [
        (supervisor, "Sam Supervisor", "Shift supervisor", 6.0, 4.6),
        (agent, "Alex Agent", "Support agent", 4.0, 4.2),
    ] {
        a003_individual_performance::service::create(
            db,
            IndividualPerformanceDto {
                id: None,
                code: None,
                team_plan_ref: service_plan.clone(),
                employee_ref: Some(employee_ref),
                name: name.into(),
                position: position.into(),
                individual_weight: weight,
                monthly_targets: monthly(year, 12, 5.0),
                monthly_actuals: monthly(year, MONTHS_WITH_ACTUALS, actual),
                status: None,
                comment: None,
            },
        )
        .await?;
    }

    tracing::info!("Demo data seeded for {}: {} KPIs", year, KPIS.len());
    Ok(true)
}

fn employee(
    code: &str,
    full_name: &str,
    position: &str,
    team: &str,
    role: Role,
    manager_ref: Option<String>,
) -> EmployeeDto {
    EmployeeDto {
        id: None,
        code: code.into(),
        full_name: full_name.into(),
        position: position.into(),
        team: team.into(),
        email: None,
        role,
        manager_ref,
        is_active: true,
        comment: None,
    }
}

fn team_plan(kpi_ref: &str, team_name: &str, weight: f64, monthly_targets: PeriodValues) -> TeamActionPlanDto {
    TeamActionPlanDto {
        id: None,
        code: None,
        kpi_ref: kpi_ref.into(),
        team_name: team_name.into(),
        team_weight: weight,
        team_target: None,
        monthly_targets,
        comments: None,
    }
}
