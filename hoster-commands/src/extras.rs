use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Opaque dependency injection for command handlers: Docker client pool,
/// encryption key, config directory, base domain — anything a handler
/// needs that isn't the store itself. Keyed by a short name rather than
/// `TypeId` so the same concrete type can be registered under different
/// roles if ever needed.
#[derive(Clone, Default)]
pub struct Extras(Arc<DashMap<&'static str, Arc<dyn Any + Send + Sync>>>);

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: &'static str, value: T) {
        self.0.insert(key, Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &'static str) -> Option<Arc<T>> {
        self.0
            .get(key)
            .and_then(|entry| entry.value().clone().downcast::<T>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_typed_value() {
        let extras = Extras::new();
        extras.insert("base_domain", "example.com".to_string());
        let value = extras.get::<String>("base_domain").unwrap();
        assert_eq!(*value, "example.com");
    }

    #[test]
    fn missing_key_is_none() {
        let extras = Extras::new();
        assert!(extras.get::<String>("nope").is_none());
    }

    #[test]
    fn wrong_type_at_the_right_key_is_none() {
        let extras = Extras::new();
        extras.insert("count", 5_i32);
        assert!(extras.get::<String>("count").is_none());
    }
}
