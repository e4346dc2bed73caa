pub mod source;
pub mod status_socket;
pub mod sync;
