pub mod flow_controller;
pub mod item_ctx;

pub use flow_controller::{FlowController, FlowOutcome};
pub use item_ctx::ItemCtx;
