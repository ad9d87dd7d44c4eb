pub mod cache_info;
pub mod definition_loader;
pub mod loaders;
pub mod store;
pub mod xteas;
