use dashmap::DashMap;
use hoster_data::{DataError, Store};
use hoster_schema::Row;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::extras::Extras;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct CommandError(pub String);

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "command failed: {}", self.0)
    }
}

impl std::error::Error for CommandError {}

impl From<DataError> for CommandError {
    fn from(err: DataError) -> Self {
        CommandError(err.to_string())
    }
}

/// Dependencies every command handler gets: the store, the opaque extras
/// bag (Docker pool, cloud provider factory, encryption key, base domain,
/// ...), and the bus itself — a handler that drives a resource through
/// more than one state (e.g. `schedule_deployment` pushing on into
/// `starting`) re-dispatches the destination state's on-enter command
/// through `ctx.bus` rather than calling it directly, so the chain always
/// goes through the same registry the REST layer uses.
#[derive(Clone)]
pub struct CommandContext {
    pub store: Arc<dyn Store>,
    pub extras: Extras,
    pub bus: CommandBus,
}

pub type HandlerFn = Arc<
    dyn Fn(CommandContext, &'static str, String, Row) -> BoxFuture<'static, Result<(), CommandError>>
        + Send
        + Sync,
>;

/// A string-keyed registry of on-enter command handlers, written once at
/// startup and read-only thereafter.
#[derive(Clone, Default)]
pub struct CommandBus {
    handlers: Arc<DashMap<&'static str, HandlerFn>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &'static str, handler: HandlerFn) {
        self.handlers.insert(name, handler);
    }

    /// Dispatch a command by name. An unknown command is not an error —
    /// it permits the schema to declare on-enter commands that have no
    /// side effect yet — it only logs a warning.
    pub async fn dispatch(
        &self,
        ctx: CommandContext,
        command: &str,
        resource: &'static str,
        reference_id: String,
        row: Row,
    ) -> Result<(), CommandError> {
        let Some(handler) = self.handlers.get(command).map(|h| h.clone()) else {
            tracing::warn!(command, "no handler registered for command, ignoring");
            return Ok(());
        };
        handler(ctx, resource, reference_id, row).await
    }
}

#[macro_export]
macro_rules! register_handler {
    ($bus:expr, $name:expr, $handler:path) => {
        $bus.register(
            $name,
            std::sync::Arc::new(move |ctx, resource, reference_id, row| {
                Box::pin($handler(ctx, resource, reference_id, row))
            }),
        )
    };
}
