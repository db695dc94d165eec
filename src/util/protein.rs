/// 蛋白质字母表大小：{0:$, 1..=20: ACDEFGHIKLMNPQRSTVWY, 21: X}
pub const SIGMA: usize = 22;

/// 标准氨基酸（编码 1..=20 的顺序）
pub const RESIDUES: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// 非标准残基（X、B、Z、U、O、J 以及 SEG 屏蔽位点）统一编码为 21，且永不匹配
pub const UNKNOWN: u8 = 21;

const fn build_encode_table() -> [u8; 256] {
    let mut t = [UNKNOWN; 256];
    let mut i = 0;
    while i < RESIDUES.len() {
        let up = RESIDUES[i];
        t[up as usize] = (i + 1) as u8;
        t[(up + 32) as usize] = (i + 1) as u8;
        i += 1;
    }
    t
}

static ENCODE: [u8; 256] = build_encode_table();

#[inline]
pub fn to_alphabet(b: u8) -> u8 {
    ENCODE[b as usize]
}

#[inline]
pub fn from_alphabet(a: u8) -> u8 {
    match a {
        0 => b'$',
        1..=20 => RESIDUES[(a - 1) as usize],
        _ => b'X',
    }
}

/// 该编码是否可参与精确匹配（排除 $ 与 X）
#[inline]
pub fn is_matchable(a: u8) -> bool {
    a != 0 && a < UNKNOWN
}

pub fn encode_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| to_alphabet(b)).collect()
}

pub fn decode_seq(codes: &[u8]) -> String {
    codes.iter().map(|&a| from_alphabet(a) as char).collect()
}

/// 去除非字母字符并转为大写（空白、数字、'-' 等直接丢弃）
pub fn strip_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .filter(|b| b.is_ascii_alphabetic() || **b == b'*')
        .map(u8::to_ascii_uppercase)
        .collect()
}
