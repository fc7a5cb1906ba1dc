//! Группировка и суммирование весов/баллов KPI
//!
//! Иерархия свёртки: individual → team → KPI → perspective → company.

use super::scoring::score_contribution;
use crate::enums::Perspective;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Допуск при сравнении сумм весов
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Элемент с весом и выполнением за текущий период
pub trait Weighted {
    fn weight(&self) -> f64;
    fn achievement(&self) -> Option<f64>;

    /// Вклад в балл с ограничением выполнения 120%
    fn score(&self) -> f64 {
        score_contribution(self.weight(), self.achievement())
    }
}

/// Элемент, принадлежащий одной перспективе BSC
pub trait InPerspective {
    fn perspective(&self) -> Perspective;
}

/// Сумма весов и баллов группы
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Subtotal {
    pub weight: f64,
    pub score: f64,
}

impl Add for Subtotal {
    type Output = Subtotal;

    fn add(self, rhs: Subtotal) -> Subtotal {
        Subtotal {
            weight: self.weight + rhs.weight,
            score: self.score + rhs.score,
        }
    }
}

impl AddAssign for Subtotal {
    fn add_assign(&mut self, rhs: Subtotal) {
        self.weight += rhs.weight;
        self.score += rhs.score;
    }
}

impl Sum for Subtotal {
    fn sum<I: Iterator<Item = Subtotal>>(iter: I) -> Subtotal {
        iter.fold(Subtotal::default(), Add::add)
    }
}

/// Сгруппировать записи по перспективам за один проход
///
/// Внутри группы сохраняется порядок следования, группы идут в каноническом
/// порядке перспектив. Пустые группы не создаются.
pub fn group_by_perspective<T: InPerspective>(entries: &[T]) -> BTreeMap<Perspective, Vec<&T>> {
    let mut groups: BTreeMap<Perspective, Vec<&T>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.perspective()).or_default().push(entry);
    }
    groups
}

/// Сумма весов и вкладов в балл
pub fn subtotal<'a, T, I>(entries: I) -> Subtotal
where
    T: Weighted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entries
        .into_iter()
        .map(|e| Subtotal {
            weight: e.weight(),
            score: e.score(),
        })
        .sum()
}

/// Итог по всему (отфильтрованному) набору
pub fn grand_total<T: Weighted>(entries: &[T]) -> Subtotal {
    subtotal(entries)
}

/// Результат проверки суммы весов
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightCheck {
    pub expected: f64,
    pub actual: f64,
    pub balanced: bool,
}

/// Проверить, что сумма весов равна ожидаемой (обычно 100)
pub fn check_weight_total<T: Weighted>(entries: &[T], expected: f64) -> WeightCheck {
    let actual: f64 = entries.iter().map(|e| e.weight()).sum();
    WeightCheck {
        expected,
        actual,
        balanced: (actual - expected).abs() <= WEIGHT_TOLERANCE,
    }
}

/// Результат сверки распределения веса родителя между потомками
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationCheck {
    pub parent: f64,
    pub allocated: f64,
    pub remaining: f64,
    pub over_allocated: bool,
}

/// Сверить распределение (не блокирует сохранение, только сообщает)
pub fn reconcile_allocation<I>(parent: f64, children: I) -> AllocationCheck
where
    I: IntoIterator<Item = f64>,
{
    let allocated: f64 = children.into_iter().sum();
    AllocationCheck {
        parent,
        allocated,
        remaining: parent - allocated,
        over_allocated: allocated - parent > WEIGHT_TOLERANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::scoring::compute_achievement;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: u32,
        perspective: Perspective,
        weight: f64,
        target: f64,
        actual: f64,
    }

    impl Weighted for Entry {
        fn weight(&self) -> f64 {
            self.weight
        }
        fn achievement(&self) -> Option<f64> {
            compute_achievement(self.target, self.actual)
        }
    }

    impl InPerspective for Entry {
        fn perspective(&self) -> Perspective {
            self.perspective
        }
    }

    fn entry(id: u32, perspective: Perspective, weight: f64, target: f64, actual: f64) -> Entry {
        Entry {
            id,
            perspective,
            weight,
            target,
            actual,
        }
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry(1, Perspective::Customer, 10.0, 100.0, 95.0),
            entry(2, Perspective::Financial, 15.0, 5.0, 4.5),
            entry(3, Perspective::Customer, 20.0, 50.0, 70.0),
            entry(4, Perspective::LearningGrowth, 15.0, 4.0, 0.0),
            entry(5, Perspective::Financial, 40.0, 10.0, 10.0),
            entry(6, Perspective::InternalBusinessProcess, 0.0, 0.0, 3.0),
        ]
    }

    #[test]
    fn test_example_subtotal() {
        let entries = vec![
            entry(1, Perspective::Financial, 15.0, 5.0, 4.5),
            entry(2, Perspective::Financial, 40.0, 10.0, 10.0),
        ];
        let total = grand_total(&entries);
        assert!((total.weight - 55.0).abs() < 1e-9);
        assert!((total.score - 53.5).abs() < 1e-9);
    }

    #[test]
    fn test_grouping_is_a_partition_preserving_order() {
        let entries = sample();
        let groups = group_by_perspective(&entries);

        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                Perspective::Financial,
                Perspective::Customer,
                Perspective::InternalBusinessProcess,
                Perspective::LearningGrowth,
            ]
        );

        let financial: Vec<u32> = groups[&Perspective::Financial].iter().map(|e| e.id).collect();
        assert_eq!(financial, vec![2, 5]);

        let mut flattened: Vec<u32> = groups.values().flatten().map(|e| e.id).collect();
        assert_eq!(flattened.len(), entries.len());
        flattened.sort();
        assert_eq!(flattened, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_subtotal_is_additive_over_groups() {
        let entries = sample();
        let groups = group_by_perspective(&entries);
        let by_groups: Subtotal = groups
            .values()
            .map(|g| subtotal(g.iter().copied()))
            .sum();
        let total = grand_total(&entries);
        assert!((by_groups.weight - total.weight).abs() < 1e-9);
        assert!((by_groups.score - total.score).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_achievement_contributes_nothing() {
        let entries = vec![entry(1, Perspective::Customer, 30.0, 0.0, 12.0)];
        let total = grand_total(&entries);
        assert_eq!(total.weight, 30.0);
        assert_eq!(total.score, 0.0);
    }

    #[test]
    fn test_weight_check() {
        let entries = sample();
        let check = check_weight_total(&entries, 100.0);
        assert!(check.balanced);

        let check = check_weight_total(&entries[..2], 100.0);
        assert!(!check.balanced);
        assert_eq!(check.actual, 25.0);
    }

    #[test]
    fn test_reconcile_allocation() {
        let ok = reconcile_allocation(40.0, [10.0, 20.0]);
        assert!(!ok.over_allocated);
        assert_eq!(ok.remaining, 10.0);

        let over = reconcile_allocation(40.0, vec![25.0, 20.0]);
        assert!(over.over_allocated);
        assert_eq!(over.remaining, -5.0);
    }
}
