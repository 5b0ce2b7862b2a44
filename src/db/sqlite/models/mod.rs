pub mod reading;
pub mod subscription;
