pub mod control;
pub mod flow_state;
pub mod profile;
pub mod snapshot;

pub use control::{ControlResponse, ControlSignal};
pub use flow_state::{ActionControl, FieldControl, FieldRef, FlowState, JobDetails, RadioMember};
pub use profile::{is_jobs_page, Platform, SuccessfulApp, UserData};
pub use snapshot::{
    ButtonSnapshot, ChoiceOption, FieldKind, FieldSnapshot, ListItemSnapshot, ListingSnapshot,
    ModalSnapshot, PageButtonSnapshot, SectionSnapshot,
};
