pub mod loaders;
pub mod work_item;

pub use loaders::{discover, Discovery};
pub use work_item::{parse_file_name, WorkItem};
