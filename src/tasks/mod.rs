pub mod filter;
pub mod service;

pub use filter::{DEFAULT_PAGE_SIZE, ListView, filter_tasks, paginate, total_pages};
pub use service::TaskService;
