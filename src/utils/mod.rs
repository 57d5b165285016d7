//! Backend-agnostic helpers shared by the page controllers
//!
//! Rate limiting, pagination, lazy loading and a time-expiring cache. None of
//! these know anything about roads or traffic.

pub mod cache;
pub mod lazy_load;
pub mod pagination;
pub mod rate_limit;

pub use cache::SimpleCache;
pub use lazy_load::{LazyElement, LazyLoader, LazySource};
pub use pagination::{PageLink, PageTarget, Pagination, PaginationControls};
pub use rate_limit::{Debounce, Throttle};
