use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for a loop over `len` items; hidden when `enabled` is false.
pub fn progress_bar(len: usize, enabled: bool, unit: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let template = format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}");
    let style = ProgressStyle::default_bar()
        .template(&template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
