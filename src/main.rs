use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod daemon;
mod dispatch;
mod error;
mod events;
mod services;
mod settings;
mod utils;

use dispatch::Mode;
use services::{create_command_runner, create_key_grabber};
use settings::{LoggingSettings, Settings};

#[derive(Parser, Debug)]
#[command(name = "microrun")]
#[command(about = "Демон горячих клавиш: запускает команды по сочетаниям из конфига")]
struct Args {
    /// Путь к файлу горячих клавиш
    #[arg(short, long)]
    config: PathBuf,

    /// Путь к файлу настроек демона
    #[arg(short, long, default_value = "microrun.toml")]
    settings: PathBuf,

    /// Режим сухого запуска: события из stdin, команды только в лог
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (переопределяет настройки)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(&args.settings)?;
    if let Some(level) = args.log_level {
        settings.logging.level = level;
        settings.validate()?;
    }

    init_tracing(&settings.logging)?;

    info!("Запуск microrun v{}", env!("CARGO_PKG_VERSION"));
    info!("Файл горячих клавиш: {:?}", args.config);

    if args.config.is_dir() {
        bail!("{:?} является директорией, а не файлом конфигурации", args.config);
    }

    if args.dry_run {
        warn!("Режим сухого запуска - устройство не захватывается, команды не выполняются");
    } else {
        utils::permissions::check_permissions()?;
    }

    let mut grabber = create_key_grabber(&settings, args.dry_run)?;
    let runner = create_command_runner(args.dry_run);

    loop {
        let mode = tokio::select! {
            mode = daemon::run_cycle(&args.config, &settings, grabber.as_mut(), runner.as_ref()) => mode,
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(e) => error!("Ошибка при ожидании сигнала завершения: {}", e),
                }
                Mode::Exit
            }
        };

        match mode {
            Mode::Restart => info!("Перезагрузка конфигурации {:?}", args.config),
            Mode::Exit | Mode::Continue => break,
        }
    }

    info!("microrun завершил работу");
    Ok(())
}

fn init_tracing(logging: &LoggingSettings) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
