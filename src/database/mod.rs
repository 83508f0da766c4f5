pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Collection, Constraint, IdentityStore, Scope, Store, StoreError, StoreResult};

use chrono::{DateTime, SubsecRound, Utc};

/// Current instant at the precision Postgres stores (microseconds), so
/// timestamps compare equal after a round trip through either backend.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
