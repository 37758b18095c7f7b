//! 查找引擎配置

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct FindConfig {
    /// 内容变更后到重新搜索的静默期（毫秒）
    pub research_delay_ms: u64,
    /// 高亮装饰的匹配数上限，只影响展示
    pub max_highlight_matches: usize,
    /// 全部替换 / 全选时的匹配数上限
    pub max_operation_matches: usize,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            research_delay_ms: 100,
            max_highlight_matches: 999,
            max_operation_matches: 1 << 24,
        }
    }
}

impl FindConfig {
    pub fn research_delay(&self) -> Duration {
        Duration::from_millis(self.research_delay_ms)
    }
}
