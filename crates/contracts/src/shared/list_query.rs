//! Фильтрация и постраничный вывод списков
//!
//! Конвейер: фильтр (с сохранением исходного порядка) → срез страницы.

use crate::enums::{KpiCategory, PerformanceStatus, Perspective};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Набор предикатов списка. `None` означает "без ограничения".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Подстрока для поиска по наименованию/коду/определению (без учёта регистра)
    pub search: Option<String>,
    pub perspective: Option<Perspective>,
    pub category: Option<KpiCategory>,
    pub status: Option<PerformanceStatus>,
    /// Начало диапазона дат (включительно)
    pub date_from: Option<NaiveDate>,
    /// Конец диапазона дат (включительно)
    pub date_to: Option<NaiveDate>,
}

/// Строка списка, к которой применим [`ListFilter`]
pub trait Filterable {
    /// Поля, по которым выполняется текстовый поиск
    fn search_fields(&self) -> Vec<&str>;

    fn perspective(&self) -> Option<Perspective> {
        None
    }

    fn category(&self) -> Option<KpiCategory> {
        None
    }

    fn status(&self) -> Option<PerformanceStatus> {
        None
    }

    /// Дата, выведенная из периода строки
    fn reference_date(&self) -> Option<NaiveDate> {
        None
    }
}

impl ListFilter {
    /// Нет ни одного активного предиката
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.perspective.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        if let Some(term) = self.search_term() {
            let found = item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !found {
                return false;
            }
        }
        if self.perspective.is_some() && item.perspective() != self.perspective {
            return false;
        }
        if self.category.is_some() && item.category() != self.category {
            return false;
        }
        if self.status.is_some() && item.status() != self.status {
            return false;
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = item.reference_date() else {
                return false;
            };
            if self.date_from.map_or(false, |from| date < from) {
                return false;
            }
            if self.date_to.map_or(false, |to| date > to) {
                return false;
            }
        }
        true
    }

    /// Отфильтровать, сохраняя исходный порядок
    pub fn apply<T: Filterable + Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().filter(|i| self.matches(*i)).cloned().collect()
    }
}

/// Страница результата
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Количество строк после фильтрации
    pub total: usize,
    /// Номер страницы (с единицы)
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    (total + page_size - 1) / page_size
}

/// Срез `items[(page-1)*page_size .. page*page_size]`
///
/// Страница 0 трактуется как первая, страница за концом списка даёт пустой срез.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        total: items.len(),
        page,
        page_size,
        total_pages: total_pages(items.len(), page_size),
    }
}

/// Состояние списка: фильтр и текущая страница
///
/// Любое изменение фильтра сбрасывает страницу на первую, поэтому
/// номер страницы из прошлого набора недостижим.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    filter: ListFilter,
    page: usize,
    page_size: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: ListFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Состояние из параметров запроса
    pub fn from_request(filter: ListFilter, page: Option<usize>, page_size: Option<usize>) -> Self {
        let mut state = Self::new(page_size.unwrap_or(DEFAULT_PAGE_SIZE));
        state.filter = filter;
        state.set_page(page.unwrap_or(1));
        state
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filter(&mut self, filter: ListFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        let mut filter = self.filter.clone();
        filter.search = search;
        self.set_filter(filter);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Ограничить номер страницы количеством страниц для `total` строк
    pub fn clamp_page(&mut self, total: usize) {
        let last = total_pages(total, self.page_size).max(1);
        self.page = self.page.min(last);
    }

    /// Фильтр → страница
    pub fn apply<T: Filterable + Clone>(&self, items: &[T]) -> Page<T> {
        let filtered = self.filter.apply(items);
        paginate(&filtered, self.page, self.page_size)
    }
}
