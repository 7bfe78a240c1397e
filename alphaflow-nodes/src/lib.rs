mod registry;

pub mod chat_models;
pub mod coerce;
pub mod config;
pub mod credential;
pub mod inputs;
pub mod node;
pub mod node_type;
pub mod params;
pub mod zylon;

pub use credential::*;
pub use node::*;
pub use node_type::*;
pub use params::*;
pub use registry::*;

pub mod registry_helper;
pub use registry_helper::register_all_components;
