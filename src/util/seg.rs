//! 仿 SEG（Wootton & Federhen）的低复杂度屏蔽。
//!
//! 组成熵降到 `trigger` 比特的窗口开启一个低复杂度区段，区段向熵不超过
//! `extension` 比特的相邻窗口扩展。被屏蔽的残基替换为不可匹配的编码，
//! 既不能产生种子也不能参与延伸。

use super::protein::{SIGMA, UNKNOWN};

#[derive(Debug, Clone, Copy)]
pub struct SegParams {
    pub window: usize,
    pub trigger: f64,
    pub extension: f64,
}

impl Default for SegParams {
    fn default() -> Self {
        Self { window: 12, trigger: 2.2, extension: 2.5 }
    }
}

/// 每个长度为 `w` 的窗口的香农熵（比特），按起点索引
fn window_entropies(codes: &[u8], w: usize) -> Vec<f64> {
    let n = codes.len();
    if w == 0 || n < w {
        return Vec::new();
    }
    let mut counts = [0u32; SIGMA];
    for &c in &codes[..w] {
        counts[c as usize % SIGMA] += 1;
    }
    let wf = w as f64;
    let entropy = |counts: &[u32; SIGMA]| -> f64 {
        counts
            .iter()
            .filter(|&&k| k > 0)
            .map(|&k| {
                let p = k as f64 / wf;
                -p * p.log2()
            })
            .sum()
    };

    let mut out = Vec::with_capacity(n - w + 1);
    out.push(entropy(&counts));
    for i in 1..=(n - w) {
        counts[codes[i - 1] as usize % SIGMA] -= 1;
        counts[codes[i + w - 1] as usize % SIGMA] += 1;
        out.push(entropy(&counts));
    }
    out
}

/// 返回合并、排序后的低复杂度半开区间
pub fn low_complexity_regions(codes: &[u8], p: &SegParams) -> Vec<(usize, usize)> {
    let h = window_entropies(codes, p.window);
    let mut regions: Vec<(usize, usize)> = Vec::new();
    let mut i = 0usize;
    while i < h.len() {
        if h[i] > p.trigger {
            i += 1;
            continue;
        }
        let mut lo = i;
        while lo > 0 && h[lo - 1] <= p.extension {
            lo -= 1;
        }
        let mut hi = i;
        while hi + 1 < h.len() && h[hi + 1] <= p.extension {
            hi += 1;
        }
        let (b, e) = (lo, hi + p.window);
        match regions.last_mut() {
            Some(last) if b <= last.1 => last.1 = last.1.max(e),
            _ => regions.push((b, e)),
        }
        i = hi + 1;
    }
    regions
}

/// 原地屏蔽低复杂度区段，返回被屏蔽的残基数
pub fn mask_low_complexity(codes: &mut [u8], p: &SegParams) -> usize {
    let mut masked = 0usize;
    for (b, e) in low_complexity_regions(codes, p) {
        for c in &mut codes[b..e] {
            if *c != UNKNOWN {
                *c = UNKNOWN;
                masked += 1;
            }
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::protein::encode_seq;

    #[test]
    fn homopolymer_run_is_masked() {
        let mut codes = encode_seq(b"MKVLWDERTYNCAAAAAAAAAAAAAAAAHGFPIQSTWVKLMD");
        let masked = mask_low_complexity(&mut codes, &SegParams::default());
        assert!(masked >= 16);
        let s = crate::util::protein::decode_seq(&codes);
        assert!(s.contains("XXXXXXXXXXXXXXXX"), "got {}", s);
        assert!(s.starts_with("MKV"));
        assert!(s.ends_with("LMD"));
    }

    #[test]
    fn diverse_sequence_is_untouched() {
        let original = encode_seq(b"MKVLWDERTYNCAHGFPIQSTWVKLMDE");
        let mut codes = original.clone();
        assert_eq!(mask_low_complexity(&mut codes, &SegParams::default()), 0);
        assert_eq!(codes, original);
    }

    #[test]
    fn short_sequences_skip_masking() {
        let mut codes = encode_seq(b"AAAAA");
        assert_eq!(mask_low_complexity(&mut codes, &SegParams::default()), 0);
        assert!(low_complexity_regions(&codes, &SegParams::default()).is_empty());
    }
}
