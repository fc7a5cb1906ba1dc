use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Служебные поля записи: даты, пометка удаления, версия
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    /// 0 до первой записи в БД, далее растёт при каждом обновлении
    pub version: i32,
}

impl EntityMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            is_deleted: false,
            version: 0,
        }
    }

    /// Метаданные строки БД; отсутствующие даты заменяются текущим временем
    pub fn restore(
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        is_deleted: bool,
        version: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            created_at: created_at.unwrap_or(now),
            updated_at: updated_at.or(created_at).unwrap_or(now),
            is_deleted,
            version,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_falls_back_to_created_at() {
        let created = Utc::now() - chrono::Duration::days(3);
        let meta = EntityMetadata::restore(Some(created), None, false, 4);
        assert_eq!(meta.updated_at, created);
        assert_eq!(meta.version, 4);
        assert!(EntityMetadata::new().version == 0);
    }
}
