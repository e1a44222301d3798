use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("webmirror")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("webmirror")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("mirror")
                .about(
                    "Mirror a website to a local directory, following links from the seed page \
                up to a bounded depth.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed page to start from (http:// is assumed when no scheme is given)"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("How many links away from the seed page to follow")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Directory the mirror is written to")
                        .default_value("./mirror"),
                )
                .arg(
                    arg!(-e --"extensions" <LIST>)
                        .required(false)
                        .help("Comma-separated file suffixes to save for non-HTML resources")
                        .default_value("png,jpg"),
                )
                .arg(
                    arg!(-s --"scope" <SCOPE>)
                        .required(false)
                        .help(
                            "Which links may be followed: all, host (same host as the seed) or \
                        descendants (at or below the seed's directory)",
                        )
                        .value_parser(["all", "host", "descendants"])
                        .default_value("host"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of concurrent requests. 1 keeps document order.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-r --"report" <PATH>)
                        .required(false)
                        .help("Save the report to a file (default: print to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Log every request (same as RUST_LOG=debug)")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
