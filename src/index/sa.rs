use rayon::prelude::*;

/// 前缀倍增构建后缀数组。
///
/// `text` 为编码后的蛋白质串联文本，可含多个 `$`(0) 分隔符；
/// 结果与按字节字典序直接比较各后缀的顺序一致（较短的前缀排在前面）。
pub fn build_sa(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    // 名次从 1 开始，0 留给越过文本末尾的位置
    let mut rank: Vec<u32> = text.iter().map(|&c| c as u32 + 1).collect();
    let mut sa: Vec<u32> = (0..n as u32).collect();
    let mut keys = vec![0u64; n];

    let mut k = 1usize;
    loop {
        keys.par_iter_mut().enumerate().for_each(|(i, key)| {
            let next = rank.get(i + k).copied().unwrap_or(0);
            *key = (u64::from(rank[i]) << 32) | u64::from(next);
        });
        sa.par_sort_unstable_by_key(|&i| keys[i as usize]);

        let mut r = 0u32;
        let mut prev = None;
        for &i in &sa {
            let key = keys[i as usize];
            if prev != Some(key) {
                r += 1;
                prev = Some(key);
            }
            rank[i as usize] = r;
        }
        if r as usize == n || k >= n {
            break;
        }
        k <<= 1;
    }
    sa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::protein::encode_seq;

    fn by_comparison(text: &[u8]) -> Vec<u32> {
        let mut idx: Vec<u32> = (0..text.len() as u32).collect();
        idx.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
        idx
    }

    fn with_terminator(s: &[u8]) -> Vec<u8> {
        let mut t = encode_seq(s);
        t.push(0);
        t
    }

    #[test]
    fn single_protein() {
        let text = with_terminator(b"MKVLA");
        // $, A$, KVLA$, LA$, MKVLA$, VLA$
        assert_eq!(build_sa(&text), vec![5, 4, 1, 3, 0, 2]);
    }

    #[test]
    fn empty_and_single_symbol() {
        assert!(build_sa(&[]).is_empty());
        assert_eq!(build_sa(&[0]), vec![0]);
    }

    #[test]
    fn homopolymer_needs_several_rounds() {
        let text = with_terminator(b"AAAAAAAAAAAAAAAAAAAA");
        let sa = build_sa(&text);
        let expect: Vec<u32> = (0..text.len() as u32).rev().collect();
        assert_eq!(sa, expect);
    }

    #[test]
    fn concatenated_database_agrees_with_direct_sort() {
        let mut text = Vec::new();
        for p in [&b"MKVLA"[..], b"MKVLX", b"WHWHCY", b"MKVLA", b"GGGGG"] {
            text.extend(with_terminator(p));
        }
        assert_eq!(build_sa(&text), by_comparison(&text));
    }

    #[test]
    fn pseudo_random_texts_agree_with_direct_sort() {
        let mut x: u32 = 97;
        for len in 1..=60 {
            let text: Vec<u8> = (0..len)
                .map(|_| {
                    x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (x >> 24) as u8 % 6
                })
                .collect();
            assert_eq!(build_sa(&text), by_comparison(&text), "len {}", len);
        }
    }
}
