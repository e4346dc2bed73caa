pub mod client;

pub use client::AppleMusicHttpAdapter;
