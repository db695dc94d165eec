//! 运行参数。启动时确定，之后由所有 worker 只读共享。

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 最大精确匹配，按长度排序
    Mem,
    /// 允许替换的延伸，按 BLOSUM62 得分排序
    Greedy,
}

/// MEM 模式下双端 read 两个 mate 的合并方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPolicy {
    /// 两个 mate 都须有匹配；某个 mate 的匹配仅在其分类号与另一 mate
    /// 的某个匹配在根以下有共同祖先时保留
    RequireBoth,
    /// 直接合并两个 mate 的匹配
    Either,
}

#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub mode: Mode,
    pub min_fragment_length: usize,
    pub min_score: i32,
    pub seed_length: usize,
    pub max_mismatches: u32,
    pub evalue: Option<f64>,
    pub threads: usize,
    pub seg: bool,
    pub input_is_protein: bool,
    pub queue_capacity: usize,
    /// Greedy 延伸中当前得分低于最佳得分超过此值即停止
    pub xdrop: i32,
    pub prune_subsumed: bool,
    pub pair_policy: PairPolicy,
    pub verbose_output: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Greedy,
            min_fragment_length: 11,
            min_score: 65,
            seed_length: 7,
            max_mismatches: 3,
            evalue: None,
            threads: 1,
            seg: true,
            input_is_protein: false,
            queue_capacity: 500,
            xdrop: 20,
            prune_subsumed: true,
            pair_policy: PairPolicy::RequireBoth,
            verbose_output: false,
        }
    }
}

impl ClassifyConfig {
    pub fn validate(&self, paired: bool) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        if self.min_fragment_length == 0 {
            return Err(ConfigError::MinFragmentLength);
        }
        if self.min_score <= 0 {
            return Err(ConfigError::MinScore);
        }
        if self.seed_length == 0 {
            return Err(ConfigError::SeedLength);
        }
        if let Some(e) = self.evalue {
            if !(e > 0.0) {
                return Err(ConfigError::EvalueNotPositive(e));
            }
            if self.mode != Mode::Greedy {
                return Err(ConfigError::EvalueRequiresGreedy);
            }
        }
        if paired && self.input_is_protein {
            return Err(ConfigError::PairedProteinInput);
        }
        Ok(())
    }

    /// 当前模式下能产生种子的最短片段长度
    pub fn min_seed_length(&self) -> usize {
        match self.mode {
            Mode::Mem => self.min_fragment_length,
            Mode::Greedy => self.seed_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ClassifyConfig::default().validate(true), Ok(()));
    }

    #[test]
    fn evalue_only_in_greedy() {
        let cfg = ClassifyConfig { mode: Mode::Mem, evalue: Some(0.01), ..Default::default() };
        assert_eq!(cfg.validate(false), Err(ConfigError::EvalueRequiresGreedy));
        let cfg = ClassifyConfig { evalue: Some(0.0), ..Default::default() };
        assert_eq!(cfg.validate(false), Err(ConfigError::EvalueNotPositive(0.0)));
    }

    #[test]
    fn rejects_zero_limits() {
        let cfg = ClassifyConfig { threads: 0, ..Default::default() };
        assert_eq!(cfg.validate(false), Err(ConfigError::NoThreads));
        let cfg = ClassifyConfig { queue_capacity: 0, ..Default::default() };
        assert_eq!(cfg.validate(false), Err(ConfigError::NoQueueCapacity));
        let cfg = ClassifyConfig { min_score: 0, ..Default::default() };
        assert_eq!(cfg.validate(false), Err(ConfigError::MinScore));
    }

    #[test]
    fn protein_input_cannot_be_paired() {
        let cfg = ClassifyConfig { input_is_protein: true, ..Default::default() };
        assert_eq!(cfg.validate(true), Err(ConfigError::PairedProteinInput));
        assert_eq!(cfg.validate(false), Ok(()));
    }

    #[test]
    fn seed_length_follows_mode() {
        let mut cfg = ClassifyConfig::default();
        assert_eq!(cfg.min_seed_length(), 7);
        cfg.mode = Mode::Mem;
        assert_eq!(cfg.min_seed_length(), 11);
    }
}
