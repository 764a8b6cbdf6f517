/// An abstract header getter so identity resolution can be exercised
/// against a plain map in tests without pulling in axum's request types.
pub trait HeaderGetter {
    fn header(&self, name: &str) -> Option<String>;
}

impl HeaderGetter for http::HeaderMap {
    fn header(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

impl HeaderGetter for std::collections::HashMap<&str, &str> {
    fn header(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_string())
    }
}
