pub mod batch_result;
pub mod loaders;
pub mod order;
pub mod template;

pub use batch_result::{BatchResult, JobFailure, LabelOutput};
pub use loaders::{load_orders, load_template, OrderBatch, TemplateSource};
pub use order::Order;
pub use template::{BarcodeBox, LabelTemplate, TextElement};
