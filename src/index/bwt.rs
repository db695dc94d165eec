/// 根据后缀数组构建 BWT：BWT[i] = text[SA[i] - 1]（SA[i] 为 0 时取文本末尾）。
/// text 为蛋白质字母表编码（0..SIGMA），以 0 结尾。
pub fn build_bwt(text: &[u8], sa: &[u32]) -> Vec<u8> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    sa.iter()
        .map(|&p| {
            let i = p as usize;
            if i == 0 { text[n - 1] } else { text[i - 1] }
        })
        .collect()
}
