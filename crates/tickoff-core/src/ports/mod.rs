//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 外部システム（DB、時計、ID 生成）への境界はすべてここを通ります。
//!
//! # 設計原則
//! - 永続化は TodoStore が正本
//! - completion ジョブはメモリ上のキューのみ（todo_id だけを流す）

pub mod clock;
pub mod id_generator;
pub mod todo_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::todo_store::{TodoFilter, TodoStore};
