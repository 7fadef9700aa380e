pub mod json_config_repository;

pub use json_config_repository::JsonConfigRepository;
