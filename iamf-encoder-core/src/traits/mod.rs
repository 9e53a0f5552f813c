pub mod encoder_delegate;
pub mod pcm_source;
