pub mod projection;
pub mod reindex;
