// ABOUTME: Multi-step new-import wizard
// ABOUTME: Step controller, mapping editor and schedule form

pub mod controller;
pub mod mapping;
pub mod schedule;

pub use controller::{
    FetchOutcome, FetchScope, PendingFetch, Selections, Step, StepCandidates, WizardController,
    WizardSession,
};
pub use mapping::{MappingCatalog, MappingContext, MappingEditor};
pub use schedule::{Recurrence, ScheduleForm};
