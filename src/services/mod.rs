pub mod commands;
pub mod events;
pub mod indicators;
pub mod messages;
pub mod notifications;
