/// 核苷酸编码：A=0, C=1, G=2, T/U=3，其他（N 等）为 4
#[inline]
fn base_code(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' | b'U' => 3,
        _ => 4,
    }
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

/// 标准遗传密码表，下标为 16*b1 + 4*b2 + b3（TCAG 以外的顺序按 ACGT 编码）
const CODON_TABLE: &[u8; 64] =
    b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

/// 翻译单个密码子；含歧义碱基时返回 X，终止密码子返回 '*'
#[inline]
pub fn translate_codon(codon: &[u8]) -> u8 {
    let (a, b, c) = (base_code(codon[0]), base_code(codon[1]), base_code(codon[2]));
    if a > 3 || b > 3 || c > 3 {
        return b'X';
    }
    CODON_TABLE[(a as usize) * 16 + (b as usize) * 4 + c as usize]
}

/// 按给定起始偏移（0..3）翻译整条序列
pub fn translate_frame(seq: &[u8], offset: usize) -> Vec<u8> {
    if seq.len() < offset + 3 {
        return Vec::new();
    }
    seq[offset..].chunks_exact(3).map(translate_codon).collect()
}

/// 六框翻译并在终止密码子处切分，丢弃短于 `min_len` 的片段。
/// 输出顺序为 +1、+2、+3、-1、-2、-3 框，框内按位置。
pub fn six_frame_peptides(seq: &[u8], min_len: usize) -> Vec<Vec<u8>> {
    let rc = revcomp(seq);
    let mut out = Vec::new();
    for s in [seq, rc.as_slice()] {
        for offset in 0..3 {
            let aa = translate_frame(s, offset);
            out.extend(
                aa.split(|&c| c == b'*')
                    .filter(|piece| !piece.is_empty() && piece.len() >= min_len)
                    .map(<[u8]>::to_vec),
            );
        }
    }
    out
}
