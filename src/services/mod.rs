pub mod answer_store;
pub mod field_classifier;
pub mod field_filler;
pub mod operator_prompt;
pub mod option_matcher;
pub mod outcome_tracker;
pub mod step_classifier;

pub use answer_store::AnswerStore;
pub use field_filler::{FieldFiller, FillResult};
pub use operator_prompt::{ConsolePrompt, OperatorPrompt, PromptSlot};
pub use outcome_tracker::OutcomeTracker;
