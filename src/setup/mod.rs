pub mod prompt;
pub mod wizard;

pub use prompt::{Prompter, StdinPrompter};
pub use wizard::{SetupWizard, WizardScreen};
