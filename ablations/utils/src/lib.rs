//! 消融实验依赖的通用组件.

use std::env;
use std::io::{self, Write};

pub mod loader;

/// 分隔线宽度.
const RULE_WIDTH: usize = 56;

/// 将一条分隔线写进 `w` 中. `title` 非空时嵌在分隔线开头.
pub fn sep_to<W: Write>(mut w: W, title: &str) -> io::Result<()> {
    if title.is_empty() {
        return writeln!(w, "{}", "-".repeat(RULE_WIDTH));
    }
    let rest = RULE_WIDTH.saturating_sub(title.chars().count() + 4);
    writeln!(w, "-- {title} {}", "-".repeat(rest))
}

/// 在标准输出打印分隔线.
#[inline]
pub fn sep(title: &str) {
    // 标准输出写入失败时没有可以补救的地方.
    let _ = sep_to(io::stdout().lock(), title);
}

/// 获得倍率扫描可用的并行线程数.
///
/// 若环境变量 `$MR_BERRY_THREADS` 为正整数则使用之, 否则为机器的可并行核心数.
pub fn cpus() -> usize {
    match env::var("MR_BERRY_THREADS").ok().and_then(|s| s.parse::<usize>().ok()) {
        Some(n) if n > 0 => n,
        _ => std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from),
    }
}

#[cfg(test)]
mod tests {
    use super::{sep_to, RULE_WIDTH};

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        sep_to(&mut buf, "").unwrap();
        sep_to(&mut buf, "Sweep").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "-".repeat(RULE_WIDTH));
        assert!(lines[1].starts_with("-- Sweep -"));
        assert_eq!(lines[1].chars().count(), RULE_WIDTH);
    }
}
