use crate::config::{ConfigSource, ShortcutCompiler};
use crate::dispatch::{DispatchLoop, Mode, ShortcutTable};
use crate::error::Result;
use crate::services::{CommandRunner, KeyGrabber};
use crate::settings::Settings;
use crate::debug_if_enabled;
use std::path::Path;
use tracing::{error, info, warn};

/// Один цикл демона: компиляция конфига и цикл событий.
/// Ошибки конфига завершают работу (`Mode::Exit`), `Restart` повторяет цикл.
pub async fn run_cycle(
    config_path: &Path,
    settings: &Settings,
    grabber: &mut dyn KeyGrabber,
    runner: &dyn CommandRunner,
) -> Mode {
    let table = match compile(config_path, settings, runner) {
        Ok(Some(table)) => table,
        Ok(None) => {
            error!("В {:?} не найдено ни одного сочетания, завершаем работу", config_path);
            return Mode::Exit;
        }
        Err(e) => {
            error!("{}", e);
            return Mode::Exit;
        }
    };

    info!("Загружено {} сочетаний из {:?}", table.len(), config_path);
    DispatchLoop::new(&table, grabber, runner).run().await
}

/// `None`, если в конфиге нет ни одного сочетания
fn compile(
    config_path: &Path,
    settings: &Settings,
    runner: &dyn CommandRunner,
) -> Result<Option<ShortcutTable>> {
    let source = ConfigSource::new(config_path, settings.parser.clone());
    let compiler = ShortcutCompiler::new(&settings.parser);

    let report = compiler.scan(source.open()?, runner)?;
    if !report.diagnostics.is_empty() {
        warn!(
            "{:?}: {} предупреждений, проблемные строки пропущены",
            source.path(),
            report.diagnostics.len()
        );
    }
    if report.shortcut_amount == 0 {
        return Ok(None);
    }

    let table = compiler.build(source.open()?, &report)?;
    for binding in table.iter() {
        debug_if_enabled!("{} -> {}", binding.shortcut, binding.command);
    }
    Ok(Some(table))
}
