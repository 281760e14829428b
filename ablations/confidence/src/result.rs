//! 实验结果.

use mr_berry::error::{SegError, SegResult};
use mr_berry::metrics::OverlapMeasures;
use mr_berry::pipeline::PipelineReport;
use mr_berry::segment::GrowthReport;
use std::io::{self, Write};
use std::time::Duration;

const S4: &str = "    ";

/// 单个倍率的扫描结果.
pub struct SweepEntry {
    pub multiplier: f64,
    pub report: Option<GrowthReport>,
    pub overlap: Option<SegResult<OverlapMeasures>>,
    pub elapsed: Duration,
    pub error: Option<SegError>,
}

#[inline]
fn f64_to_display(f: Option<f64>) -> String {
    match f {
        Some(f) => format!("{f:.6}"),
        None => "/".to_string(),
    }
}

#[inline]
fn mask_to_display(r: &SegResult<mr_berry::data::MrMask>) -> String {
    match r {
        Ok(m) => format!("{} voxels", m.count_foreground()),
        Err(e) => format!("failed ({e})"),
    }
}

/// 将流程结果写进 `w` 中.
fn describe_pipeline_into<W: Write>(p: &PipelineReport<f32>, w: &mut W) -> io::Result<()> {
    writeln!(w, "Pipeline:")?;
    writeln!(w, "{S4}Threshold: {}", mask_to_display(&p.threshold))?;
    writeln!(w, "{S4}Growth: {}", mask_to_display(&p.growth))?;
    if let Some(r) = &p.growth_report {
        writeln!(
            w,
            "{S4}{S4}{} iterations, converged: {}, mean {:.3}, std {:.3}",
            r.iterations, r.converged, r.mean, r.std
        )?;
    }
    writeln!(w, "{S4}Cleaned: {}", mask_to_display(&p.cleaned))?;
    match &p.sample {
        Ok(s) => {
            writeln!(w, "{S4}Sample: {} voxels in [{:?}, {:?})", s.len(), s.lower, s.upper)?;
            if let Some(b) = s.summary() {
                writeln!(
                    w,
                    "{S4}{S4}min {:.2}, q1 {:.2}, median {:.2}, q3 {:.2}, max {:.2}",
                    b.min, b.q1, b.median, b.q3, b.max
                )?;
            }
        }
        Err(e) => writeln!(w, "{S4}Sample: failed ({e})")?,
    }
    match &p.dice {
        Some(d) => {
            let show = |r: &SegResult<f64>| f64_to_display(r.as_ref().ok().copied());
            write!(
                w,
                "{S4}Dice: threshold {}, growth {}, cleaned {}",
                show(&d.threshold),
                show(&d.growth),
                show(&d.cleaned)
            )?;
        }
        None => write!(w, "{S4}Dice: no reference")?,
    }
    Ok(())
}

/// 将单个倍率的扫描结果写进 `w` 中.
fn describe_entry_into<W: Write>(e: &SweepEntry, w: &mut W) -> io::Result<()> {
    writeln!(w, "Multiplier {:.2}:", e.multiplier)?;
    if let Some(err) = &e.error {
        writeln!(w, "{S4}Failed: {err}")?;
    }
    if let Some(r) = &e.report {
        writeln!(w, "{S4}Grown voxels: {}", r.voxels)?;
        writeln!(w, "{S4}Iterations: {} (converged: {})", r.iterations, r.converged)?;
    }
    match &e.overlap {
        Some(Ok(m)) => {
            writeln!(w, "{S4}Dice: {}", f64_to_display(Some(m.dice())))?;
            writeln!(w, "{S4}Jaccard: {}", f64_to_display(Some(m.jaccard())))?;
            writeln!(
                w,
                "{S4}FN / FP error: {} / {}",
                f64_to_display(Some(m.false_negative_error())),
                f64_to_display(Some(m.false_positive_error()))
            )?;
        }
        Some(Err(err)) => writeln!(w, "{S4}Overlap failed: {err}")?,
        None => writeln!(w, "{S4}Dice: /")?,
    }
    write!(w, "{S4}Machine time: {} us", e.elapsed.as_micros())?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    pipeline: PipelineReport<f32>,
    sweep: Vec<SweepEntry>,
}

impl AblationResult {
    pub fn new(pipeline: PipelineReport<f32>, sweep: Vec<SweepEntry>) -> Self {
        Self { pipeline, sweep }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep("Pipeline");
        let mut buf = Vec::with_capacity(512);

        describe_pipeline_into(&self.pipeline, &mut buf).unwrap();
        println!("{}", std::str::from_utf8(&buf).unwrap());
        buf.clear();
        utils::sep("Sweep");

        for entry in self.sweep.iter() {
            describe_entry_into(entry, &mut buf).unwrap();
            println!("{}", std::str::from_utf8(&buf).unwrap());
            buf.clear();
            utils::sep("");
        }

        let best = self
            .sweep
            .iter()
            .filter_map(|e| match &e.overlap {
                Some(Ok(m)) => Some((e.multiplier, m.dice())),
                _ => None,
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((m, d)) = best {
            utils::sep("Best");
            println!("Best multiplier: {m:.2} (Dice {d:.6})");
        }
    }
}
