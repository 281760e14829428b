//! 置信连通区域生长实验: 完整流程 + 标准差倍率扫描.

mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();
    runner::run().analyze();
}
