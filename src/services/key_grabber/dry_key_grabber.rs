use crate::config::compiler::get_shortcut;
use crate::config::lexer::Cursor;
use crate::error::{MicrorunError, Result};
use crate::events::{KeyPress, Shortcut};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::r#trait::KeyGrabber;

/// Вызов захвата/освобождения, записанный dry-run захватчиком
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabCall {
    Grab(Shortcut),
    Ungrab(Shortcut),
}

/// Общий журнал вызовов
#[derive(Debug, Clone, Default)]
pub struct GrabLog(Arc<Mutex<Vec<GrabCall>>>);

impl GrabLog {
    fn record(&self, call: GrabCall) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<GrabCall> {
        self.0.lock().clone()
    }
}

/// Захватчик без устройства: события приходят из канала,
/// вызовы grab/ungrab только записываются.
pub struct DryRunKeyGrabber {
    events: mpsc::UnboundedReceiver<KeyPress>,
    grabbed: HashSet<Shortcut>,
    log: GrabLog,
}

impl DryRunKeyGrabber {
    pub fn new(events: mpsc::UnboundedReceiver<KeyPress>) -> Self {
        info!("Инициализация DryRunKeyGrabber");
        Self {
            events,
            grabbed: HashSet::new(),
            log: GrabLog::default(),
        }
    }

    /// События читаются из stdin строками вида `38+Mod4`
    pub fn from_stdin() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_key_press(&line) {
                        Some(press) => {
                            if sender.send(press).is_err() {
                                break;
                            }
                        }
                        None => warn!("[DRY RUN] Не удалось разобрать событие: {:?}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("[DRY RUN] Ошибка чтения stdin: {}", e);
                        break;
                    }
                }
            }
            info!("[DRY RUN] stdin закрыт, источник событий завершён");
        });

        info!("[DRY RUN] Вводите события в виде <keycode>[+<Modifier>]*, например 38+Mod4");
        Self::new(receiver)
    }

    #[cfg(test)]
    pub fn log(&self) -> GrabLog {
        self.log.clone()
    }
}

impl Drop for DryRunKeyGrabber {
    fn drop(&mut self) {
        info!("[DRY RUN] Всего вызовов grab/ungrab: {}", self.log.calls().len());
    }
}

/// Разбирает событие в синтаксисе сочетаний конфига
pub fn parse_key_press(line: &str) -> Option<KeyPress> {
    let mut cursor = Cursor::new(line);
    cursor.skip_whitespace();
    let shortcut = get_shortcut(&mut cursor);
    shortcut
        .is_bound()
        .then(|| KeyPress::new(shortcut.keycode.value(), shortcut.modifiers))
}

#[async_trait::async_trait]
impl KeyGrabber for DryRunKeyGrabber {
    fn grab(&mut self, shortcut: Shortcut) -> Result<()> {
        self.log.record(GrabCall::Grab(shortcut));
        if !self.grabbed.insert(shortcut) {
            return Err(MicrorunError::GrabConflict(shortcut));
        }
        info!("[DRY RUN] Захват сочетания {}", shortcut);
        Ok(())
    }

    fn ungrab(&mut self, shortcut: Shortcut) -> Result<()> {
        self.log.record(GrabCall::Ungrab(shortcut));
        self.grabbed.remove(&shortcut);
        info!("[DRY RUN] Освобождение сочетания {}", shortcut);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<KeyPress> {
        // Незарегистрированные сочетания не доставляются, как и у настоящего захвата
        while let Some(press) = self.events.recv().await {
            if self.grabbed.contains(&press.as_shortcut()) {
                return Ok(press);
            }
            info!("[DRY RUN] Сочетание {} не зарегистрировано, пропускаем", press);
        }
        Err(MicrorunError::EventSourceClosed)
    }
}
