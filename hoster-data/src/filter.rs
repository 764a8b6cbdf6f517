use crate::page::Pagination;
use serde_json::Value;

/// An equality or set-membership constraint on a single column. The store
/// backend is responsible for turning these into parameterized predicates —
/// callers never build SQL fragments themselves.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
}

/// Everything a `list` call needs: which rows, in what order, how many.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub pagination: Pagination,
    pub order_by: Option<&'static str>,
    pub descending: bool,
}

impl ListQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            filters: Vec::new(),
            pagination,
            order_by: None,
            descending: true,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
        self.order_by = Some(column);
        self.descending = descending;
        self
    }
}
