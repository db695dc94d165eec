//! 蛋白质字母表上的 BLOSUM62 替换得分。

use super::protein::UNKNOWN;

/// 与分隔符或表外编码比较时的得分
pub const DEFAULT_SCORE: i32 = -4;

/// 行列顺序：ACDEFGHIKLMNPQRSTVWY X（字母表编码 1..=21）
#[rustfmt::skip]
static BLOSUM62: [[i8; 21]; 21] = [
    //     A   C   D   E   F   G   H   I   K   L   M   N   P   Q   R   S   T   V   W   Y   X
    /*A*/ [ 4,  0, -2, -1, -2,  0, -2, -1, -1, -1, -1, -2, -1, -1, -1,  1,  0,  0, -3, -2, -1],
    /*C*/ [ 0,  9, -3, -4, -2, -3, -3, -1, -3, -1, -1, -3, -3, -3, -3, -1, -1, -1, -2, -2, -1],
    /*D*/ [-2, -3,  6,  2, -3, -1, -1, -3, -1, -4, -3,  1, -1,  0, -2,  0, -1, -3, -4, -3, -1],
    /*E*/ [-1, -4,  2,  5, -3, -2,  0, -3,  1, -3, -2,  0, -1,  2,  0,  0, -1, -2, -3, -2, -1],
    /*F*/ [-2, -2, -3, -3,  6, -3, -1,  0, -3,  0,  0, -3, -4, -3, -3, -2, -2, -1,  1,  3, -1],
    /*G*/ [ 0, -3, -1, -2, -3,  6, -2, -4, -2, -4, -3,  0, -2, -2, -2,  0, -2, -3, -2, -3, -1],
    /*H*/ [-2, -3, -1,  0, -1, -2,  8, -3, -1, -3, -2,  1, -2,  0,  0, -1, -2, -3, -2,  2, -1],
    /*I*/ [-1, -1, -3, -3,  0, -4, -3,  4, -3,  2,  1, -3, -3, -3, -3, -2, -1,  3, -3, -1, -1],
    /*K*/ [-1, -3, -1,  1, -3, -2, -1, -3,  5, -2, -1,  0, -1,  1,  2,  0, -1, -2, -3, -2, -1],
    /*L*/ [-1, -1, -4, -3,  0, -4, -3,  2, -2,  4,  2, -3, -3, -2, -2, -2, -1,  1, -2, -1, -1],
    /*M*/ [-1, -1, -3, -2,  0, -3, -2,  1, -1,  2,  5, -2, -2,  0, -1, -1, -1,  1, -1, -1, -1],
    /*N*/ [-2, -3,  1,  0, -3,  0,  1, -3,  0, -3, -2,  6, -2,  0,  0,  1,  0, -3, -4, -2, -1],
    /*P*/ [-1, -3, -1, -1, -4, -2, -2, -3, -1, -3, -2, -2,  7, -1, -2, -1, -1, -2, -4, -3, -1],
    /*Q*/ [-1, -3,  0,  2, -3, -2,  0, -3,  1, -2,  0,  0, -1,  5,  1,  0, -1, -2, -2, -1, -1],
    /*R*/ [-1, -3, -2,  0, -3, -2,  0, -3,  2, -2, -1,  0, -2,  1,  5, -1, -1, -3, -3, -2, -1],
    /*S*/ [ 1, -1,  0,  0, -2,  0, -1, -2,  0, -2, -1,  1, -1,  0, -1,  4,  1, -2, -3, -2, -1],
    /*T*/ [ 0, -1, -1, -1, -2, -2, -2, -1, -1, -1, -1,  0, -1, -1, -1,  1,  5,  0, -2, -2, -1],
    /*V*/ [ 0, -1, -3, -2, -1, -3, -3,  3, -2,  1,  1, -3, -2, -2, -3, -2,  0,  4, -3, -1, -1],
    /*W*/ [-3, -2, -4, -3,  1, -2, -2, -3, -3, -2, -1, -4, -4, -2, -3, -3, -2, -3, 11,  2, -1],
    /*Y*/ [-2, -2, -3, -2,  3, -3,  2, -1, -2, -1, -1, -2, -3, -1, -2, -2, -2, -1,  2,  7, -1],
    /*X*/ [-1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1],
];

/// 两个字母表编码之间的替换得分
#[inline]
pub fn score(a: u8, b: u8) -> i32 {
    if a == 0 || b == 0 || a > UNKNOWN || b > UNKNOWN {
        return DEFAULT_SCORE;
    }
    BLOSUM62[(a - 1) as usize][(b - 1) as usize] as i32
}

/// 对角线得分之和，即该序列可能达到的最高分
pub fn self_score(codes: &[u8]) -> i32 {
    codes.iter().map(|&a| score(a, a)).sum()
}
