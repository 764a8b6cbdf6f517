use hoster_data::DataError;

/// Extension trait for converting `sqlx::Error` into [`DataError`].
///
/// Orphan rules keep us from implementing `From<sqlx::Error> for DataError`
/// in `hoster-data` (which doesn't depend on sqlx) or here (which doesn't
/// own `DataError`). `.into_data_error()` bridges the two at every call
/// site instead.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::storage("row not found"),
            other => DataError::storage(other),
        }
    }
}
