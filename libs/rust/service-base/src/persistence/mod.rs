//! Data-access helpers: pagination, audit timestamps and the MySQL pool.

mod audit;
pub mod local_datetime;
mod pagination;
mod pool;

pub use audit::{AuditFields, Auditable};
pub use pagination::{MAX_PAGE_SIZE, Page, PageRequest};
pub use pool::DatabaseConfig;
