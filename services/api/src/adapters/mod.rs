pub mod barcode;
pub mod db;
pub mod directions;
pub mod memory;
pub mod vision_llm;

pub use barcode::OpenFoodFactsAdapter;
pub use db::DbAdapter;
pub use directions::HttpDirectionsAdapter;
pub use memory::MemoryStore;
pub use vision_llm::{DisabledVisionAdapter, OpenAiVisionAdapter};
