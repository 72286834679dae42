use std::process::Stdio;
use tracing::{debug, info, warn};

/// Запуск команд оболочки без ожидания результата
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str);
}

/// Запускает `sh -c <command>` и сразу забывает о процессе.
/// Завершившиеся процессы подбирает рантайм tokio.
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) {
        match tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                debug!("Запущена команда {:?} (pid {:?})", command, child.id());
            }
            Err(e) => {
                warn!("Не удалось запустить команду {:?}: {}", command, e);
            }
        }
    }
}

pub struct DryRunCommandRunner;

impl CommandRunner for DryRunCommandRunner {
    fn run(&self, command: &str) {
        info!("[DRY RUN] Команда: {}", command);
    }
}

/// Factory function to create a command runner based on the dry_run flag
pub fn create_command_runner(dry_run: bool) -> Box<dyn CommandRunner> {
    if dry_run {
        Box::new(DryRunCommandRunner)
    } else {
        Box::new(ShellCommandRunner::new())
    }
}
