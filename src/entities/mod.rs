pub mod sync_blob;
