use serde::Serialize;

/// Default and maximum page sizes from spec §4.2: "limit capped at 1000, default 100".
pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// Offset-based pagination parameters, already clamped to the documented
/// boundary behavior: `limit <= 0` becomes the default, `limit > 1000` is
/// capped, `offset < 0` becomes zero.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l <= 0 => DEFAULT_LIMIT,
            Some(l) if l > MAX_LIMIT => MAX_LIMIT,
            Some(l) => l,
            None => DEFAULT_LIMIT,
        };
        let offset = match offset {
            Some(o) if o < 0 => 0,
            Some(o) => o,
            None => 0,
        };
        Self { limit, offset }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of rows plus the metadata the REST envelope reports back.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            content,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_limit_becomes_default() {
        assert_eq!(Pagination::new(Some(0), None).limit, DEFAULT_LIMIT);
        assert_eq!(Pagination::new(Some(-5), None).limit, DEFAULT_LIMIT);
        assert_eq!(Pagination::new(None, None).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn oversized_limit_is_clamped() {
        assert_eq!(Pagination::new(Some(5000), None).limit, MAX_LIMIT);
        assert_eq!(Pagination::new(Some(MAX_LIMIT), None).limit, MAX_LIMIT);
        assert_eq!(Pagination::new(Some(MAX_LIMIT + 1), None).limit, MAX_LIMIT);
    }

    #[test]
    fn negative_offset_is_coerced_to_zero() {
        assert_eq!(Pagination::new(None, Some(-1)).offset, 0);
        assert_eq!(Pagination::new(None, Some(42)).offset, 42);
    }
}
