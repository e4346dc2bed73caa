pub mod apple_music;
pub mod background;
pub mod retry;
pub mod spotify;
pub mod storage;
pub mod sync;
