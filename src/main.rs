use audio_tagger::{cli, config};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::Cli::parse();
    let cfg = config::load_config();
    init_logging(&cfg);

    if let Err(e) = cli::run(cli, cfg) {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}

/// 로그는 stderr로만 보낸다. stdout은 `serve` 응답용이다.
fn init_logging(cfg: &config::Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cfg.log_filter.as_deref().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
