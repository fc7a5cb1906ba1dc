//! Дерево каскада целей: company → perspective → KPI → team → individual

use super::aggregation::{Subtotal, Weighted};
use super::scoring::{compute_achievement, implied_status, score_contribution};
use crate::enums::PerformanceStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeLevel {
    Company,
    Perspective,
    Kpi,
    Team,
    Individual,
}

/// Узел каскада
///
/// Лист несёт собственные цель/факт. Для узла с потомками `score` равен
/// сумме баллов потомков.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeNode {
    pub level: CascadeLevel,
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub target: Option<f64>,
    pub actual: Option<f64>,
    pub achievement: Option<f64>,
    pub score: f64,
    pub status: PerformanceStatus,
    pub children: Vec<CascadeNode>,
}

impl CascadeNode {
    /// Узел с собственными показателями
    pub fn leaf(
        level: CascadeLevel,
        id: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
        target: Option<f64>,
        actual: Option<f64>,
        achievement: Option<f64>,
    ) -> Self {
        Self {
            level,
            id: id.into(),
            name: name.into(),
            weight,
            target,
            actual,
            achievement,
            score: score_contribution(weight, achievement),
            status: implied_status(achievement),
            children: Vec::new(),
        }
    }

    /// Узел, чьи вес и балл складываются из потомков
    ///
    /// Выполнение узла: `score / weight * 100`.
    pub fn rollup(
        level: CascadeLevel,
        id: impl Into<String>,
        name: impl Into<String>,
        children: Vec<CascadeNode>,
    ) -> Self {
        let total: Subtotal = children.iter().map(CascadeNode::subtotal).sum();
        let achievement = compute_achievement(total.weight, total.score);
        Self {
            level,
            id: id.into(),
            name: name.into(),
            weight: total.weight,
            target: None,
            actual: None,
            achievement,
            score: total.score,
            status: implied_status(achievement),
            children,
        }
    }

    /// Прикрепить потомков, сохранив собственные показатели узла
    pub fn with_children(mut self, children: Vec<CascadeNode>) -> Self {
        self.children = children;
        self
    }

    /// Ручной статус (например, из записи IPM)
    pub fn with_status(mut self, status: PerformanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn subtotal(&self) -> Subtotal {
        Subtotal {
            weight: self.weight,
            score: self.score,
        }
    }

    /// Сумма весов и баллов непосредственных потомков
    pub fn children_subtotal(&self) -> Subtotal {
        self.children.iter().map(CascadeNode::subtotal).sum()
    }

    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(CascadeNode::leaf_count).sum()
        }
    }
}

impl Weighted for CascadeNode {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn achievement(&self) -> Option<f64> {
        self.achievement
    }

    fn score(&self) -> f64 {
        self.score
    }
}
