pub mod encoder;
pub mod payloads;
pub mod workflow;
