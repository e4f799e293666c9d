//! Core of the pricing-elasticity panel: password lifecycle and
//! price-change simulation. Rendering lives elsewhere and calls in
//! through `panel::Panel`.

pub mod artifacts;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod event;
pub mod features;
pub mod model;
pub mod panel;
pub mod password;
pub mod policy;
pub mod reference;
pub mod session;
pub mod simulator;
pub mod store;
pub mod types;
