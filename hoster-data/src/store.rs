use async_trait::async_trait;
use hoster_schema::Row;
use serde_json::Value;

use crate::error::DataError;
use crate::filter::ListQuery;
use crate::page::Page;

/// The result of a successful state transition: the row as it now stands,
/// plus the on-enter command the caller must dispatch (if the destination
/// state declares one). Dispatch happens outside the store so that command
/// handlers can themselves call back into the store without reentrancy.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub row: Row,
    pub command: Option<&'static str>,
}

/// Backend-agnostic persistence for every resource in the schema registry.
///
/// A single implementation (see `hoster-data-sqlx`) drives every resource
/// off the same table-shaped methods — there is no per-resource repository
/// type. The schema registry supplies everything resource-specific
/// (columns, transition table, guards); the store only ever deals in
/// untyped [`Row`]s.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Insert a new row. Implementations must assign `id`, `reference_id`,
    /// `created_at`, `updated_at` and must validate `payload` against the
    /// resource's field definitions before insertion.
    async fn create(&self, resource: &'static str, payload: Row) -> Result<Row, DataError>;

    /// Fetch by public reference id (e.g. `"depl_a1b2c3"`).
    async fn get(&self, resource: &'static str, reference_id: &str) -> Result<Row, DataError>;

    /// Fetch by internal numeric id — used for foreign-key resolution
    /// where only the id is on hand (e.g. `deployment.template_id`).
    async fn get_by_id(&self, resource: &'static str, id: i64) -> Result<Row, DataError>;

    /// First row matching `field = value`, used for uniqueness checks and
    /// lookups such as `user.external_id`.
    async fn get_by_field(
        &self,
        resource: &'static str,
        field: &'static str,
        value: &Value,
    ) -> Result<Option<Row>, DataError>;

    /// Paginated listing with equality/membership filters.
    async fn list(&self, resource: &'static str, query: ListQuery) -> Result<Page<Row>, DataError>;

    /// Partial update. Implementations refresh `updated_at` and re-validate
    /// touched fields; this method never changes the state-machine column —
    /// use [`Store::transition`] for that.
    async fn update(
        &self,
        resource: &'static str,
        reference_id: &str,
        patch: Row,
    ) -> Result<Row, DataError>;

    async fn delete(&self, resource: &'static str, reference_id: &str) -> Result<(), DataError>;

    /// Attempt a state-machine transition. Implementations must perform the
    /// transition check, guard evaluation, and write as a single atomic
    /// operation (e.g. `UPDATE ... WHERE status = <from>`) so that two
    /// concurrent callers can't both succeed from the same prior state.
    async fn transition(
        &self,
        resource: &'static str,
        reference_id: &str,
        to_state: &str,
    ) -> Result<TransitionOutcome, DataError>;

    /// Escape hatch for read queries the typed surface doesn't cover.
    /// Parameters are bound positionally; implementations must never
    /// interpolate `sql` with caller data.
    async fn raw_query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, DataError>;

    /// Escape hatch for writes the typed surface doesn't cover.
    async fn raw_exec(&self, sql: &str, params: Vec<Value>) -> Result<u64, DataError>;

    /// `cloud_provision` rows joined against their owning `cloud_credential`
    /// row, so the provisioner worker can read provider + encrypted
    /// credentials in one round trip instead of N+1 lookups. This is the
    /// one cross-resource read the typed surface promotes out of
    /// `raw_query`, since the join shape is fixed and worth getting a real
    /// signature for.
    async fn list_cloud_provisions_with_credential(
        &self,
        query: ListQuery,
    ) -> Result<Page<Row>, DataError>;
}
