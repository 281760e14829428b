//! 对 `mr-berry::data::io` 的更一层封装. 提供扫描, 参考分割与流程配置的加载器.

use mr_berry::config::PipelineConfig;
use mr_berry::data::io::home_dataset_dir_with;
use mr_berry::data::resample::resample_nearest;
use mr_berry::data::{MrMask, MrScan, OpenGridError};
use mr_berry::error::SegError;
use std::path::{Path, PathBuf};
use std::{env, fmt, fs, io};

/// 若环境变量 `key` 非空则返回其值, 否则返回 `$HOME/dataset/prostate/{rest}`.
fn env_or_home<const N: usize>(key: &str, rest: [&str; N]) -> PathBuf {
    match env::var(key) {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => home_dataset_dir_with(rest).unwrap(),
    }
}

/// 获取 T2 加权 MRI 扫描路径.
///
/// 1. 若环境变量 `$MR_BERRY_SCAN` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/prostate/images/t2w.nii.gz`.
#[inline]
pub fn scan_path_from_env_or_home() -> PathBuf {
    env_or_home("MR_BERRY_SCAN", ["images", "t2w.nii.gz"])
}

/// 获取参考分割路径.
///
/// 1. 若环境变量 `$MR_BERRY_REFERENCE` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/prostate/labels/segmentation.nii.gz`.
#[inline]
pub fn reference_path_from_env_or_home() -> PathBuf {
    env_or_home("MR_BERRY_REFERENCE", ["labels", "segmentation.nii.gz"])
}

/// 获取流程配置 (JSON) 路径.
///
/// 1. 若环境变量 `$MR_BERRY_CONFIG` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/prostate/pipeline.json`.
#[inline]
pub fn config_path_from_env_or_home() -> PathBuf {
    env_or_home("MR_BERRY_CONFIG", ["pipeline.json"])
}

/// 获取输出掩膜路径.
///
/// 1. 若环境变量 `$MR_BERRY_OUTPUT` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/prostate/output/my_segmentation.nii.gz`.
#[inline]
pub fn output_path_from_env_or_home() -> PathBuf {
    env_or_home("MR_BERRY_OUTPUT", ["output", "my_segmentation.nii.gz"])
}

/// 加载流程配置错误.
#[derive(Debug)]
pub enum LoadConfigError {
    /// 文件读取错误.
    Io(io::Error),

    /// JSON 格式错误.
    Json(serde_json::Error),

    /// 配置参数不合法.
    Invalid(SegError),
}

impl fmt::Display for LoadConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadConfigError::Io(e) => write!(f, "配置文件读取错误: {e}"),
            LoadConfigError::Json(e) => write!(f, "配置文件格式错误: {e}"),
            LoadConfigError::Invalid(e) => write!(f, "配置参数不合法: {e}"),
        }
    }
}

impl std::error::Error for LoadConfigError {}

/// 从 JSON 文件加载流程配置, 并检查参数合法性.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, LoadConfigError> {
    let text = fs::read_to_string(path).map_err(LoadConfigError::Io)?;
    let config: PipelineConfig = serde_json::from_str(&text).map_err(LoadConfigError::Json)?;
    config.validate().map_err(LoadConfigError::Invalid)?;
    Ok(config)
}

/// 加载 MRI 扫描.
#[inline]
pub fn load_scan<P: AsRef<Path>>(path: P) -> Result<MrScan, OpenGridError> {
    MrScan::open(path)
}

/// 加载参考分割, 并以最近邻方式重采样到 `scan` 的网格上.
pub fn load_reference<P: AsRef<Path>>(path: P, scan: &MrScan) -> Result<MrMask, OpenGridError> {
    let reference = MrMask::open(path)?;
    Ok(resample_nearest(&reference, scan))
}

#[cfg(test)]
mod tests {
    use super::{load_config, LoadConfigError};
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config() {
        let p = write_tmp(
            "mr_berry_utils_config_ok.json",
            r#"{
                "seeds": [[120, 110, 12]],
                "threshold_bounds": [80.0, 98.0],
                "multiplier": 2.5,
                "iterations": 5,
                "structuring_radius": 2,
                "sample_point": [10.0, -20.5, 3.0],
                "sample_width": 6.0
            }"#,
        );
        let c = load_config(&p).unwrap();
        assert_eq!(c.seeds, vec![[120, 110, 12]]);
        assert_eq!(c.initial_radius, 1);
    }

    #[test]
    fn test_load_config_errors() {
        let missing = std::env::temp_dir().join("mr_berry_utils_config_missing.json");
        assert!(matches!(load_config(missing), Err(LoadConfigError::Io(_))));

        let p = write_tmp("mr_berry_utils_config_bad.json", "{ not json");
        assert!(matches!(load_config(&p), Err(LoadConfigError::Json(_))));

        let p = write_tmp(
            "mr_berry_utils_config_invalid.json",
            r#"{
                "seeds": [],
                "threshold_bounds": [80.0, 98.0],
                "multiplier": 2.5,
                "iterations": 5,
                "structuring_radius": 2,
                "sample_point": [0.0, 0.0, 0.0],
                "sample_width": 6.0
            }"#,
        );
        assert!(matches!(load_config(&p), Err(LoadConfigError::Invalid(_))));
    }
}
