//! Interface de terminal do lastpost: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`RunProgress`] consome os [`RunEvent`]s emitidos
//! pelo controlador de sessão e os reflete no terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::session::{ItemResult, RunEvent, Session};

/// Indicador visual de progresso para uma execução.
///
/// Mostra uma barra com a contagem e o ETA, e imprime uma linha por item:
/// verde para datas, amarelo para "sem posts", vermelho para erros.
#[derive(Clone)]
pub struct RunProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Compartilhado entre clones: após Ctrl-C a mensagem fica fixa em "Stopping...".
    stopping: Arc<AtomicBool>,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Cria a barra para `total` itens; o tamanho é corrigido no primeiro evento.
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(200));

        Self {
            pb,
            stopping: Arc::new(AtomicBool::new(false)),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Consome eventos até o canal fechar.
    pub async fn drive(self, mut events: UnboundedReceiver<RunEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(&event);
        }
        self.pb.finish_and_clear();
    }

    /// Atualiza a barra para refletir um evento.
    pub fn apply(&self, event: &RunEvent) {
        match event {
            RunEvent::Resumed { cursor, total } => {
                self.pb.set_length(*total as u64);
                self.pb.set_position(*cursor as u64);
                self.pb.println(format!(
                    "  {} {}",
                    self.yellow.apply_to("↻"),
                    event.status_line()
                ));
            }
            RunEvent::ItemStarted { .. } => self.set_status(event),
            RunEvent::ItemCompleted {
                result,
                cursor,
                attempts,
                ..
            } => {
                self.pb.set_position(*cursor as u64);
                self.pb.println(self.result_line(result, *attempts));
                self.set_status(event);
            }
            RunEvent::Stopped { .. } => {
                self.pb.println(format!(
                    "  {} {}",
                    self.yellow.apply_to("■"),
                    event.status_line()
                ));
            }
            RunEvent::Completed { .. } => {
                self.pb.println(format!(
                    "  {} {}",
                    self.green.apply_to("✓"),
                    event.status_line()
                ));
            }
        }
    }

    /// Mostra a mensagem de parada enquanto a requisição em andamento termina.
    pub fn stopping(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.pb.set_message("Stopping...");
    }

    fn set_status(&self, event: &RunEvent) {
        if !self.stopping.load(Ordering::SeqCst) {
            self.pb.set_message(event.status_line());
        }
    }

    fn result_line(&self, result: &ItemResult, attempts: u32) -> String {
        let retries = if attempts > 1 {
            format!(" ({attempts} attempts)")
        } else {
            String::new()
        };
        if result.failed {
            format!(
                "  {} {}: {}{retries}",
                self.red.apply_to("✗"),
                result.identifier,
                result.value
            )
        } else if result.value == crate::lookup::types::NO_POSTS {
            format!(
                "  {} {}: {}{retries}",
                self.yellow.apply_to("·"),
                result.identifier,
                result.value
            )
        } else {
            format!(
                "  {} {}: {}{retries}",
                self.green.apply_to("✓"),
                result.identifier,
                result.value
            )
        }
    }
}

/// Resumo impresso pelo comando `status`.
pub fn print_session_status(key: &str, session: Option<&Session>) {
    let bold = Style::new().bold();
    println!("Session {}:", bold.apply_to(key));
    println!("{}", session_status_line(session));
}

fn session_status_line(session: Option<&Session>) -> String {
    match session {
        Some(session) => format!(
            "Previous session found: {}/{} processed.",
            session.cursor, session.total
        ),
        None => "No previous session found.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(identifier: &str, cursor: usize) -> RunEvent {
        RunEvent::ItemCompleted {
            result: ItemResult::success(identifier, "2024-01-05"),
            cursor,
            total: 3,
            fraction: cursor as f64 / 3.0,
            eta: None,
            attempts: 1,
            backoffs: Vec::new(),
        }
    }

    #[test]
    fn progress_message_follows_events() {
        let progress = RunProgress::start(3);
        progress.apply(&completed("alice", 1));
        assert_eq!(progress.pb.message(), "1/3 checked (33%)");
    }

    #[test]
    fn stopping_message_survives_in_flight_item() {
        let progress = RunProgress::start(3);
        let handle = progress.clone();
        handle.stopping();

        progress.apply(&completed("alice", 1));
        progress.apply(&RunEvent::ItemStarted {
            index: 1,
            identifier: "bob".into(),
            total: 3,
        });

        assert_eq!(progress.pb.message(), "Stopping...");
        assert_eq!(progress.pb.position(), 1);
    }

    #[test]
    fn status_line_reports_saved_progress() {
        let mut session = Session::new(5);
        session.record(ItemResult::success("alice", "2024-01-05"));
        session.record(ItemResult::failure("bob", "Error: User not found"));

        assert_eq!(
            session_status_line(Some(&session)),
            "Previous session found: 2/5 processed."
        );
        assert_eq!(session_status_line(None), "No previous session found.");
    }
}
