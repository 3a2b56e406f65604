pub mod orchestrator;

pub use orchestrator::{Collaborators, Orchestrator};
