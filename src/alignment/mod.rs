pub mod classify;
pub(crate) mod cursor_chain;
pub mod engine;
pub mod pauses;
pub mod prenorm_diff;
pub mod report;
pub(crate) mod segments;
