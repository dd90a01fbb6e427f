use clap::Parser;
use nerfup::AppConfig;
use nerfup::server;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nerfup")]
#[command(about = "Turn uploaded photo sets into NeRF reconstructions")]
struct Cli {
    /// Host to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to the COLMAP binary
    #[arg(long, default_value = "colmap")]
    colmap: PathBuf,

    /// Instant-NGP installation root (contains scripts/run.py)
    #[arg(long, value_name = "DIR")]
    instant_ngp: PathBuf,

    /// Driver script for the hloc estimator
    #[arg(long, default_value = "./scripts/run_hloc.py")]
    hloc_script: PathBuf,

    /// Root directory for per-request scratch space
    #[arg(long, value_name = "DIR")]
    scratch: Option<PathBuf>,

    /// Training steps for Instant-NGP (negative uses the tool default)
    #[arg(long, default_value_t = -1)]
    n_steps: i64,

    /// Open the Instant-NGP viewer window while training
    #[arg(long)]
    gui: bool,

    /// Enable verbose per-stage pipeline output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> std::io::Result<()> {
    let args = Cli::parse();

    // default level is info
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    let config = AppConfig {
        host: args.host,
        port: args.port,
        colmap_binary: args.colmap,
        instant_ngp_root: args.instant_ngp,
        hloc_script: args.hloc_script,
        scratch_root: args.scratch.unwrap_or_else(std::env::temp_dir),
        n_steps: args.n_steps,
        gui: args.gui,
        verbose: args.verbose,
        ..AppConfig::default()
    };

    actix_web::rt::System::new().block_on(server::startup(config))
}
