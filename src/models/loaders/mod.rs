pub mod xml_scanner;

pub use xml_scanner::{discover, Discovery};
