use colored::Colorize;

pub mod mirror;
pub mod report;
pub mod storage;

pub use mirror::{MirrorOptions, execute_mirror};
pub use report::{ReportFormat, generate_mirror_report};
pub use storage::LocalSink;

pub fn print_banner() {
    println!(
        "{} {}",
        "webmirror".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}", "offline copies of the web, one link at a time".bright_black());
    println!();
}
