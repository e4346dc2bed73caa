pub mod client;

pub use client::SpotifyHttpAdapter;
