pub mod metrics;
pub mod store_observer;
pub mod tracing;

pub use self::metrics::{Metrics, MetricsError};
pub use self::store_observer::StoreObserver;
pub use self::tracing::{init_observability, shutdown_observability, ObservabilityError};
