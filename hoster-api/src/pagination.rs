use hoster_data::Pagination;
use std::collections::HashMap;

/// Parses JSON:API-style `page[size]`/`page[offset]`/`page[number]` query
/// params. `page[number]` is 1-based and only used when `page[offset]` is
/// absent; `page[offset]` always wins if both are given.
pub fn parse(params: &HashMap<String, String>) -> Pagination {
    let limit = params.get("page[size]").and_then(|v| v.parse::<i64>().ok());
    let offset = match params.get("page[offset]").and_then(|v| v.parse::<i64>().ok()) {
        Some(offset) => Some(offset),
        None => {
            let number = params.get("page[number]").and_then(|v| v.parse::<i64>().ok());
            match (number, limit) {
                (Some(number), Some(size)) if number > 1 => Some((number - 1) * size),
                (Some(number), None) if number > 1 => Some((number - 1) * hoster_data::DEFAULT_LIMIT),
                _ => None,
            }
        }
    };
    Pagination::new(limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_with_no_params() {
        let p = parse(&params(&[]));
        assert_eq!(p.limit, hoster_data::DEFAULT_LIMIT);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn explicit_offset_wins_over_page_number() {
        let p = parse(&params(&[("page[size]", "10"), ("page[offset]", "5"), ("page[number]", "3")]));
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 5);
    }

    #[test]
    fn page_number_is_translated_to_offset() {
        let p = parse(&params(&[("page[size]", "20"), ("page[number]", "3")]));
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 40);
    }
}
