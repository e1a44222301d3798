pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{emit_report, expand_output_dir, mirror_options_from_args, parse_url_line};

// Re-export mirror functionality from webmirror-core
pub use webmirror_core::mirror::extract_url_path;
pub use webmirror_core::{MirrorOptions, ReportFormat, execute_mirror, generate_mirror_report};
