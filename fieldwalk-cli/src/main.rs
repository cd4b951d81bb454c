use fieldwalk_cli::{commands, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();

    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match commands::run(&cli.command) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
