pub mod ingest;
pub mod inspect;
pub mod recommend;
pub mod train;
