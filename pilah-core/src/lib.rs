//! Core types and session wiring for the pilah waste pickup scheduler.

/// Request assembly from a completed wizard.
pub mod assemble;
/// Shopping-basket style selection of waste categories and quantities.
pub mod basket;
/// Static waste category and time slot catalogs.
pub mod catalog;
/// Bundle of external collaborators the service talks to.
pub mod collaborators;
/// Environment-driven configuration.
pub mod config;
/// Error taxonomy shared by the wizard, session, and service.
pub mod error;
/// Last-request-wins bookkeeping for facility retrieval.
pub mod feed;
mod gates;
pub use gates::is_valid_phone;
/// Great-circle distance.
pub mod geo;
/// Domain models and identifiers.
pub mod model;
/// Traits describing the external collaborators.
pub mod ports;
/// Distance ranking of candidate facilities.
pub mod ranking;
/// Async facade over the collaborators.
pub mod service;
/// A single scheduling session tying the wizard to the service.
pub mod session;
/// Branch-dependent step topology.
pub mod steps;
/// The multi-step scheduling wizard.
pub mod wizard;

pub use assemble::*;
pub use basket::*;
pub use catalog::*;
pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use feed::*;
pub use geo::*;
pub use model::*;
pub use ports::*;
pub use ranking::*;
pub use service::*;
pub use session::*;
pub use steps::*;
pub use wizard::*;
