//! 로컬 오디오 파일의 태그와 앨범 아트를 읽고 쓰며, 아트워크로
//! 썸네일과 정사각형 이미지를 만든다.
//!
//! 앱 셸은 이름 붙은 명령으로 [`bridge::Dispatcher`]를 호출하고,
//! 호출마다 타입 있는 응답을 정확히 하나 받는다.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
