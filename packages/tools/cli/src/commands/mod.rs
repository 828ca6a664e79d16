//! CLI 명령어 구현

pub mod check;
pub mod grants;
pub mod input;
pub mod sanitize;
