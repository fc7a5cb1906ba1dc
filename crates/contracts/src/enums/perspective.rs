use serde::{Deserialize, Serialize};

/// Перспективы Balanced Scorecard
///
/// Порядок вариантов задаёт канонический порядок групп в отчётах.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Financial,
    Customer,
    InternalBusinessProcess,
    LearningGrowth,
}

impl Perspective {
    /// Код перспективы (хранится в БД и в query string)
    pub fn code(&self) -> &'static str {
        match self {
            Perspective::Financial => "financial",
            Perspective::Customer => "customer",
            Perspective::InternalBusinessProcess => "internal_business_process",
            Perspective::LearningGrowth => "learning_growth",
        }
    }

    /// Человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            Perspective::Financial => "Financial",
            Perspective::Customer => "Customer",
            Perspective::InternalBusinessProcess => "Internal Business Process",
            Perspective::LearningGrowth => "Learning & Growth",
        }
    }

    /// Буквенный префикс номера KPI ("F1.1", "C2.3", ...)
    pub fn prefix(&self) -> &'static str {
        match self {
            Perspective::Financial => "F",
            Perspective::Customer => "C",
            Perspective::InternalBusinessProcess => "IBP",
            Perspective::LearningGrowth => "LG",
        }
    }

    /// Все перспективы в каноническом порядке
    pub fn all() -> Vec<Perspective> {
        vec![
            Perspective::Financial,
            Perspective::Customer,
            Perspective::InternalBusinessProcess,
            Perspective::LearningGrowth,
        ]
    }

    /// Парсинг из кода
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "financial" => Some(Perspective::Financial),
            "customer" => Some(Perspective::Customer),
            "internal_business_process" => Some(Perspective::InternalBusinessProcess),
            "learning_growth" => Some(Perspective::LearningGrowth),
            _ => None,
        }
    }
}

impl std::fmt::Display for Perspective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip() {
        for p in Perspective::all() {
            assert_eq!(Perspective::from_code(p.code()), Some(p));
        }
        assert_eq!(Perspective::from_code("marketing"), None);
    }

    #[test]
    fn test_canonical_order() {
        let mut shuffled = vec![
            Perspective::LearningGrowth,
            Perspective::Financial,
            Perspective::InternalBusinessProcess,
            Perspective::Customer,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Perspective::all());
    }
}
