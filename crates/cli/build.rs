use std::{env, fs, path::PathBuf};

fn page_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("60"))
}

fn service_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(--model <MODEL> "Model identifier"))
        .arg(clap::arg!(--endpoint <URL> "Chat-completions endpoint URL"))
        .arg(clap::arg!(--concurrency <NUM> "Maximum chunk requests in flight").default_value("4"))
        .arg(clap::arg!(--"fade-ms" <MS> "Fade delay before each page swap, in milliseconds").default_value("300"))
}

fn credential_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::arg!(-l --level <LEVEL> "Target CEFR level")
            .default_value("B1")
            .value_parser(["A1", "A2", "B1", "B2", "C1", "C2"]),
    )
    .arg(clap::arg!(--"api-key" <KEY> "API key for the completion service"))
}

fn export_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::arg!(--"out-dir" <DIR> "Directory for summary files")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    )
    .arg(clap::arg!(--"legacy-pdf" "Save summaries with a .pdf name and application/pdf type"))
}

fn output_arg(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::arg!(-o --output <FILE> "Output file (default: stdout)")
            .value_name("FILE")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let rewrite = output_arg(service_args(credential_args(page_args(clap::Command::new("rewrite")))))
        .about("Rewrite a page's text for a level and write the resulting HTML");
    let summarize = export_args(service_args(credential_args(page_args(clap::Command::new("summarize")))))
        .about("Summarize a page for a level and save the summary document");
    let extract = output_arg(page_args(clap::Command::new("extract")))
        .about("Print the main text of a page as it would be sent for rewriting")
        .arg(clap::arg!(--chunks "Show chunk boundaries"));
    let host = output_arg(export_args(service_args(page_args(clap::Command::new("host")))))
        .about("Answer JSON commands read from stdin, one per line");

    let mut cmd = clap::Command::new("graded")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Graded Contributors")
        .about("Rewrite or summarize web pages for a CEFR reading level")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(rewrite)
        .subcommand(summarize)
        .subcommand(extract)
        .subcommand(host);

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "graded", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "graded", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "graded", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "graded", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
