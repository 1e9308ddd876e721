pub mod js_executor;
pub mod kv_store;
pub mod page_surface;
pub mod surface;

pub use js_executor::JsExecutor;
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use page_surface::PageSurface;
pub use surface::Surface;
