//! 程序运行函数.

use crate::result::{AblationResult, SweepEntry};
use log::{info, warn};
use mr_berry::config::PipelineConfig;
use mr_berry::data::{MrMask, MrScan};
use mr_berry::metrics::OverlapMeasures;
use mr_berry::morph::closing;
use mr_berry::pipeline::run_pipeline;
use mr_berry::segment::confidence_connected_with_report;
use std::thread;
use std::time::Instant;
use utils::loader;

/// 参与扫描的标准差倍率.
const MULTIPLIERS: [f64; 7] = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

/// 以倍率 `m` 运行区域生长 + 闭运算, 并与参考分割比较.
fn sweep_one(
    scan: &MrScan,
    reference: Option<&MrMask>,
    config: &PipelineConfig,
    m: f64,
) -> SweepEntry {
    let start = Instant::now();
    let params = config.confidence_params().with_multiplier(m);
    let grown = confidence_connected_with_report(scan, &params).and_then(|(mask, report)| {
        let element = config.structuring_element()?;
        Ok((closing(&mask, &element), report))
    });
    let elapsed = start.elapsed();

    match grown {
        Ok((mask, report)) => SweepEntry {
            multiplier: m,
            report: Some(report),
            overlap: reference.map(|r| OverlapMeasures::compute(&mask, r)),
            elapsed,
            error: None,
        },
        Err(e) => SweepEntry {
            multiplier: m,
            report: None,
            overlap: None,
            elapsed,
            error: Some(e),
        },
    }
}

/// 实际运行.
pub fn run() -> AblationResult {
    let config_path = loader::config_path_from_env_or_home();
    let config = loader::load_config(&config_path)
        .unwrap_or_else(|e| panic!("Loading config `{}` error: {e}", config_path.display()));

    let scan_path = loader::scan_path_from_env_or_home();
    let scan = loader::load_scan(&scan_path)
        .unwrap_or_else(|e| panic!("Loading scan `{}` error: {e}", scan_path.display()));
    info!("scan loaded, dims = {:?}", scan.dims());

    // 参考分割是可选的.
    let reference_path = loader::reference_path_from_env_or_home();
    let reference = match loader::load_reference(&reference_path, &scan) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("reference `{}` unavailable: {e}", reference_path.display());
            None
        }
    };

    println!("Running pipeline...");
    let pipeline = run_pipeline(&scan, reference.as_ref(), &config);
    if let Ok(mask) = &pipeline.cleaned {
        let out = loader::output_path_from_env_or_home();
        match mask.save_nifti(&out) {
            Ok(()) => info!("cleaned mask saved to `{}`", out.display()),
            Err(e) => warn!("saving `{}` failed: {e}", out.display()),
        }
    }

    let threads = utils::cpus();
    println!("Running multiplier sweep on {threads} threads...");
    let mut sweep: Vec<SweepEntry> = Vec::with_capacity(MULTIPLIERS.len());
    for batch in MULTIPLIERS.chunks(threads) {
        thread::scope(|s| {
            let (scan, reference, config) = (&scan, reference.as_ref(), &config);
            let handles: Vec<_> = batch
                .iter()
                .map(|&m| s.spawn(move || sweep_one(scan, reference, config, m)))
                .collect();
            sweep.extend(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            );
        });
    }

    AblationResult::new(pipeline, sweep)
}
