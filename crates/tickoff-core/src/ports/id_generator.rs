//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::TodoId;
use crate::ports::Clock;

/// IdGenerator は todo の ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_todo_id(&self) -> TodoId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock の現在時刻を timestamp 部分に使うので、FixedClock を渡せば
/// timestamp が決定的になります（ランダム部分は毎回異なる）。
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_todo_id(&self) -> TodoId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        TodoId::from(ulid)
    }
}
