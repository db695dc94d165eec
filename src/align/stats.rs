//! 无间隙 BLOSUM62 匹配的 Karlin-Altschul 统计量。

#[derive(Debug, Clone, Copy)]
pub struct KarlinParams {
    pub lambda: f64,
    pub k: f64,
}

/// BLOSUM62 无间隙参数
pub const BLOSUM62_UNGAPPED: KarlinParams = KarlinParams { lambda: 0.3176, k: 0.134 };

/// 比特分：S' = (lambda * S - ln K) / ln 2
pub fn bit_score(raw_score: i32, params: &KarlinParams) -> f64 {
    (params.lambda * raw_score as f64 - params.k.ln()) / std::f64::consts::LN_2
}

/// E = m * n * 2^(-S')，m 为查询片段长度，n 为数据库残基总数
pub fn evalue(raw_score: i32, query_len: usize, db_len: u64, params: &KarlinParams) -> f64 {
    let space = query_len as f64 * db_len as f64;
    space * 2f64.powf(-bit_score(raw_score, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_score_matches_formula() {
        let bs = bit_score(65, &BLOSUM62_UNGAPPED);
        let expected = (0.3176 * 65.0 - 0.134f64.ln()) / 2f64.ln();
        assert!((bs - expected).abs() < 1e-12);
        assert!(bs > 32.0 && bs < 33.0);
    }

    #[test]
    fn evalue_decreases_with_score() {
        let e1 = evalue(40, 30, 1_000_000, &BLOSUM62_UNGAPPED);
        let e2 = evalue(80, 30, 1_000_000, &BLOSUM62_UNGAPPED);
        assert!(e2 < e1);
        assert!(e2 > 0.0);
    }

    #[test]
    fn evalue_scales_with_search_space() {
        let small = evalue(50, 20, 1_000, &BLOSUM62_UNGAPPED);
        let large = evalue(50, 20, 2_000, &BLOSUM62_UNGAPPED);
        assert!((large / small - 2.0).abs() < 1e-9);
    }
}
