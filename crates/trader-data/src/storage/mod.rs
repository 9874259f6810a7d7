//! 데이터셋 파일 저장소.

pub mod metadata;
pub mod table;
