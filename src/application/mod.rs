pub mod streamer;
pub mod transfer;
