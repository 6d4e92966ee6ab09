pub mod barcode_service;
pub mod label_renderer;
pub mod label_writer;

pub use barcode_service::{Barcode, BarcodeService};
pub use label_renderer::{LabelLayout, LabelRenderer};
pub use label_writer::LabelWriter;
