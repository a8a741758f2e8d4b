use std::{fmt, fs::create_dir_all};

use common::{
    config::Config,
    plot::{SourceOutcome, render_metric},
    routing::{MetricRoute, build_routing},
    sheet::Extractor,
};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub saved: usize,
    pub skipped: usize,
    pub source_failures: usize,
    pub render_failures: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} plots saved, {} metrics skipped, {} source extractions failed, {} plots failed",
            self.saved, self.skipped, self.source_failures, self.render_failures
        )
    }
}

/// Prints status lines, above the progress bar when one is shown
struct Reporter {
    bar: Option<ProgressBar>,
}

impl Reporter {
    fn new(metrics: usize, progress: bool) -> Result<Self> {
        if !progress {
            return Ok(Self { bar: None });
        }
        let bar = ProgressBar::new(metrics as u64);
        bar.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:30}] {pos}/{len} {msg}",
        )?);
        Ok(Self { bar: Some(bar) })
    }

    fn line(&self, line: impl AsRef<str>) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line.as_ref()),
        }
    }

    fn start(&self, metric: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(metric.to_owned());
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Extracts every source of `route`, in the order the sources are configured
fn extract_sources(
    config: &Config,
    route: &MetricRoute,
    extractor: &mut Extractor,
) -> Vec<SourceOutcome> {
    config
        .sources
        .iter()
        .filter_map(|source| {
            let column = route.sources.get(&source.name)?;
            let result =
                extractor.extract(&source.path, &column.sheet, &column.column, &column.filters);
            Some(SourceOutcome::new(source.name.as_str(), result))
        })
        .collect()
}

/// Renders one comparison chart per routed metric. Failures stay within
/// their metric, the run only errors if the output directory is unusable.
pub fn run(config: &Config, progress: bool) -> Result<RunSummary> {
    create_dir_all(&config.output_dir).wrap_err_with(|| {
        format!(
            "Creating output directory {}",
            config.output_dir.display()
        )
    })?;

    let routing = build_routing(config);
    let reporter = Reporter::new(routing.len(), progress)?;
    let mut extractor = Extractor::new(config.x_axis.clone());
    let mut summary = RunSummary::default();

    for route in &routing {
        reporter.start(route.label.as_str());
        let outcomes = extract_sources(config, route, &mut extractor);
        match render_metric(&config.output_dir, &route.label, outcomes) {
            Ok(report) => {
                for (source, reason) in &report.failures {
                    reporter.line(format!(
                        "[!] Error extracting '{}' for {source}: {reason}",
                        report.label
                    ));
                }
                summary.source_failures += report.failures.len();
                match &report.output {
                    Some(path) => {
                        reporter.line(format!("[✓] Saved plot: {}", path.display()));
                        summary.saved += 1;
                    }
                    None => {
                        reporter.line(format!(
                            "[!] Skipped plotting '{}' (no data extracted)",
                            report.label
                        ));
                        summary.skipped += 1;
                    }
                }
            }
            Err(err) => {
                error!("{err:?}");
                reporter.line(format!("[!] Error plotting '{}': {err:#}", route.label));
                summary.render_failures += 1;
            }
        }
        reporter.advance();
    }
    reporter.finish();

    debug!("Parsed {} sheets", extractor.cached_sheets());
    Ok(summary)
}
