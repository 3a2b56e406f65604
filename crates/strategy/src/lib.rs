pub mod analyzers;
pub mod reasoning;
pub mod services;
