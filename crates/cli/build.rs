use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pitchlens")
        .version("0.1.0")
        .author("Pitchlens Contributors")
        .about("Score the marketing messaging of a web page")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--"api-key" <KEY> "Gemini API key").value_name("KEY"))
        .arg(clap::arg!(--model <MODEL> "Model to ask").default_value("gemini-2.5-flash"))
        .arg(clap::arg!(--"base-url" <URL> "Gemini API base URL").value_name("URL"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout for fetching the page, in seconds").default_value("15"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--"max-attempts" <NUM> "Total attempts for the model call").default_value("5"))
        .arg(
            clap::arg!(--"initial-delay-ms" <MS> "Delay before the first retry, in milliseconds")
                .default_value("1000"),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(clap::arg!(--"extract-only" "Print the extracted text without analyzing it"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pitchlens", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pitchlens", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pitchlens", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pitchlens", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
