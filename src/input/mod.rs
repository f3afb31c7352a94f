use crate::app::actions::Action;
use crate::app::events::Event;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Forward stdin commands to the app until stdin closes or the app is gone.
/// EOF counts as quit.
pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let action = match lines.next_line().await {
                Ok(Some(line)) => match map_line_to_action(&line) {
                    Some(a) => a,
                    None => continue,
                },
                Ok(None) | Err(_) => Action::Quit,
            };
            let quit = action == Action::Quit;
            if tx.send(Event::Input(action)).await.is_err() || quit {
                break;
            }
        }
    });
}

pub fn map_line_to_action(line: &str) -> Option<Action> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => None,
        "p" | "play" => Some(Action::Play),
        "s" | "pause" | "stop" => Some(Action::Pause),
        "r" | "retry" | "reload" => Some(Action::Retry),
        "q" | "quit" | "exit" => Some(Action::Quit),
        _ => Some(Action::Switch(line.to_string())),
    }
}
