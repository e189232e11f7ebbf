use clap::Parser;
use patchwork_bin::{cli::Cli, commands};
use patchwork_log::LogConfig;

fn main() {
    let cli = Cli::parse();

    let _log_guard = match patchwork_log::init(LogConfig {
        log_file_path: cli.log_file.clone(),
    }) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        },
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = commands::run(cli.command, &mut stdout) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
