#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 3D 前列腺 MRI 体数据的分割, 分割评估与组织强度采样算法.
//!
//! 该 crate 只提供 `safe` 接口. 所有核心算法都是作用于内存中 [`data::VoxelGrid`] 的纯函数:
//! 接受不可变引用, 返回新分配的结果, 不会在内部执行磁盘 I/O.
//!
//! # 注意
//!
//! 1. 体数据按照 `(z, H, W)` 存储, 见 [`Idx3d`]. 与物理空间相关的接口 (种子点,
//!   坐标变换, 采样) 使用 ITK 风格的 `(x, y, z)` 索引, 见 [`VoxelIndex`].
//! 2. 物理坐标系为 LPS. 读取 nii 文件时会自动从 RAS 转换.
//! 3. 核心算法出错时返回 [`error::SegError`], 不存在部分结果.
//!   只有违反文档中写明的前提时程序才会 panic.
//!
//! # 开发计划
//!
//! ### 体数据与空间元信息 ✅
//!
//! 间距, 原点, 方向矩阵, 以及物理坐标与体素索引之间的相互转换.
//!
//! 实现位于 `mr-berry/src/data`.
//!
//! ### 二值阈值分割 ✅
//!
//! 实现位于 `mr-berry/src/segment/threshold.rs`.
//!
//! ### 置信连通区域生长 ✅
//!
//! 从一个或多个种子出发, 以区域均值和标准差决定接受区间, 迭代生长.
//! 6-相邻. 提供参数扫描.
//!
//! 实现位于 `mr-berry/src/segment`.
//!
//! ### 三维形态学操作 ✅
//!
//! 膨胀, 腐蚀, 闭运算, 开运算. 支持球形, 长方体和十字结构元素.
//!
//! 实现位于 `mr-berry/src/morph`.
//!
//! ### 分割评估 ✅
//!
//! Dice, Jaccard, 体积相似度, 假阴性/假阳性误差.
//!
//! 实现位于 `mr-berry/src/metrics`.
//!
//! ### 组织强度采样 ✅
//!
//! 以物理坐标为中心采集立方区域, 并提供箱线图所需的五数概括.
//!
//! 实现位于 `mr-berry/src/sample`.
//!
//! ### 强度预处理 ✅
//!
//! 线性拉伸, 强度窗口, 中值/均值滤波.
//!
//! 实现位于 `mr-berry/src/filter`.
//!
//! ### 流程编排 ✅
//!
//! 由 [`config::PipelineConfig`] 驱动的完整流程, 单个阶段失败不影响其它阶段.
//!
//! 实现位于 `mr-berry/src/pipeline.rs`.
//!
//! ### 26-相邻区域生长 ⌛️
//!
//! 目前固定为 6-相邻.

/// 三维存储索引 `(z, H, W)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// ITK 风格的体素索引 `(x, y, z)` == `(W, H, z)`. 允许为负, 以表示网格之外的位置.
pub type VoxelIndex = [i64; 3];

/// 物理空间 (LPS) 中的点, 单位一般为毫米.
pub type Point3 = [f64; 3];

pub mod consts;

pub mod error;

/// 3D MRI 体数据基础数据结构.
pub mod data;

pub mod filter;

pub mod segment;

pub mod morph;

pub mod metrics;

pub mod sample;

pub mod config;

pub mod pipeline;

pub mod prelude;
