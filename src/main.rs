use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tune_shelf::config::ServerSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tune_shelf=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let overrides = parse_args(std::env::args().skip(1).collect())?;
    let app_root = std::env::current_dir()?;
    let settings = ServerSettings::resolve(
        |key| {
            overrides
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        },
        &app_root,
    );

    tune_shelf::server::serve(settings).await
}

/// Command line flags map onto the same keys as the environment and win
/// over it.
fn parse_args(args: Vec<String>) -> anyhow::Result<HashMap<&'static str, String>> {
    let mut out = HashMap::new();
    let mut index = 0;
    while index < args.len() {
        let key = match args[index].as_str() {
            "--host" => "HOST",
            "--port" => "PORT",
            "--music-dir" => "MUSIC_DIR",
            "--config" => "CONFIG_FILE",
            "--ui-dir" => "UI_DIR",
            "--favorites" => "FAVORITES_FILE",
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        };
        index += 1;
        let Some(value) = args.get(index) else {
            anyhow::bail!("{} requires a value", args[index - 1]);
        };
        if value.trim().is_empty() {
            anyhow::bail!("{} cannot be empty", args[index - 1]);
        }
        out.insert(key, value.trim().to_string());
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("tune-shelf");
    println!("  --host <addr>          Bind address (HOST, default 0.0.0.0)");
    println!("  --port <port>          Bind port (PORT, default 8090)");
    println!("  --music-dir <path>     Media root (MUSIC_DIR)");
    println!("  --config <file>        Config file (CONFIG_FILE)");
    println!("  --ui-dir <path>        Static UI directory (UI_DIR)");
    println!("  --favorites <file>     Favorites file (FAVORITES_FILE)");
}
