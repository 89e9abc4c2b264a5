//! The sub-step stepper and step loop for the Josh simulation engine
//! (`spec.md` §4.H).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod stepper;

pub use config::StepperConfig;
pub use error::StepError;
pub use metrics::StepMetrics;
pub use stepper::Stepper;
