pub mod memory;
pub mod pcm;
pub mod wav;
