//! Listing parameters shared by the repositories

use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::ColumnTrait;
use serde::{Deserialize, Serialize};

/// Page request for list queries. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Zero-based page index for the SeaORM paginator
    pub fn page_index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    /// Search term, or `None` when absent or blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// One page of results plus the total number of matching rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Case-insensitive substring match on any of `columns`
pub fn search_condition<C>(columns: &[C], term: &str) -> Condition
where
    C: ColumnTrait,
{
    let pattern = format!("%{}%", term.to_lowercase());
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(lower(*column).like(pattern.as_str()))
    })
}

fn lower<C: ColumnTrait>(column: C) -> Expr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
}
