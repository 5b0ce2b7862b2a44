pub mod reading_repository;
pub mod subscription_repository;
