pub mod manager;
pub mod memory;
pub mod port;
pub mod postgres;
pub mod scoped_query;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryPersistence;
pub use port::{PersistenceError, PersistencePort, RowQuery, StoredBlob, WriteOutcome};
pub use postgres::PgPersistence;
