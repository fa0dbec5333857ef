pub mod events;
pub mod groups;
pub mod messages;
pub mod ws;
