pub mod order_loader;
pub mod template_loader;

pub use order_loader::{load_orders, mark_orders_processed, parse_orders, OrderBatch};
pub use template_loader::{load_template, parse_template, TemplateSource};
