//! Page request / page result contract shared by every list operation.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::field::{FieldDef, Filterable, Schema};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Client-requested sort on a schema field (wire name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Zero-based page index + size + optional sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub sort: Vec<SortOrder>,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, QueryError> {
        let req = Self {
            page,
            size,
            sort: Vec::new(),
        };
        req.validate()?;
        Ok(req)
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.size == 0 {
            return Err(QueryError::InvalidPage("size must be greater than 0".to_string()));
        }
        if self.size > MAX_PAGE_SIZE {
            return Err(QueryError::InvalidPage(format!(
                "size must not exceed {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// A resolved ordering key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static FieldDef,
    pub direction: Direction,
}

/// Resolve the ordering for a query against `schema`.
///
/// Requested sort fields must exist in the schema (internal fields included,
/// since sorting reveals no more than the returned rows do). The schema's id
/// is always appended as the final ascending tie-breaker unless already present,
/// so page boundaries are deterministic.
pub fn sort_keys(schema: &Schema, page: Option<&PageRequest>) -> Result<Vec<SortKey>, QueryError> {
    let mut keys = Vec::new();
    if let Some(page) = page {
        page.validate()?;
        for order in &page.sort {
            let field = schema.field(&order.field).ok_or_else(|| QueryError::UnknownField {
                entity: schema.entity,
                field: order.field.clone(),
            })?;
            if keys.iter().any(|k: &SortKey| k.field == field) {
                continue;
            }
            keys.push(SortKey {
                field,
                direction: order.direction,
            });
        }
    }
    if !keys.iter().any(|k| k.field == schema.id) {
        keys.push(SortKey {
            field: schema.id,
            direction: Direction::Asc,
        });
    }
    Ok(keys)
}

/// One slice of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page from an already-sliced `content`.
    ///
    /// `request == None` means unpaged: `content` is the whole result set.
    pub fn new(content: Vec<T>, total_elements: u64, request: Option<&PageRequest>) -> Self {
        match request {
            Some(req) => {
                let size = req.size.max(1);
                let total_pages = total_elements.div_ceil(u64::from(size));
                Self {
                    content,
                    total_elements,
                    page: req.page,
                    size: req.size,
                    total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
                }
            }
            None => {
                let size = u32::try_from(content.len()).unwrap_or(u32::MAX);
                Self {
                    content,
                    total_elements,
                    page: 0,
                    size,
                    total_pages: 1,
                }
            }
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page: self.page,
            size: self.size,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Order and slice an in-memory result set.
pub fn paginate<E: Filterable>(
    mut items: Vec<E>,
    request: Option<&PageRequest>,
) -> Result<Page<E>, QueryError> {
    let keys = sort_keys(E::schema(), request)?;
    items.sort_by(|a, b| compare_by(&keys, a, b));

    let total = items.len() as u64;
    let Some(req) = request else {
        return Ok(Page::new(items, total, None));
    };

    let offset = usize::try_from(req.offset()).unwrap_or(usize::MAX);
    let content: Vec<E> = items
        .into_iter()
        .skip(offset)
        .take(req.size as usize)
        .collect();
    Ok(Page::new(content, total, Some(req)))
}

/// Compare two entities by resolved sort keys. Absent values sort first, as
/// `NULLS FIRST` does in the SQL backend.
pub fn compare_by<E: Filterable>(keys: &[SortKey], a: &E, b: &E) -> Ordering {
    for key in keys {
        let ord = match (a.field_value(key.field), b.field_value(key.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
        };
        let ord = match key.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
