use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use flashdeck_lib::flashcards::algorithm::{format_interval, preview_intervals};
use flashdeck_lib::flashcards::{Phase, ReviewRating, SessionError, StudySession};

use crate::app::App;
use crate::render::terminal::{self, Color};

/// What the user typed at the prompt
enum Input {
    Reveal,
    Rate(ReviewRating),
    Next,
    Previous,
    Restart,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_lowercase().as_str() {
        "" | "s" | "show" => Input::Reveal,
        "n" | "next" => Input::Next,
        "p" | "prev" | "previous" => Input::Previous,
        "r" | "restart" => Input::Restart,
        "q" | "quit" | "exit" => Input::Quit,
        other => match other.parse::<ReviewRating>() {
            Ok(rating) => Input::Rate(rating),
            Err(_) => Input::Unknown,
        },
    }
}

pub async fn run(app: &App, set_name: Option<&str>, force_all: bool, use_color: bool) -> Result<()> {
    let scope = app.scope_for(set_name)?;

    let mut session = match StudySession::start(app.session_context(), scope, force_all).await {
        Ok(session) => session,
        Err(SessionError::EmptyQueue(_)) => {
            println!("No cards due. Add new cards or study anyway with --all.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    session.subscribe(|event| log::debug!("Session event: {:?}", event));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_state(app, &session, use_color);
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match (session.phase(), parse_input(&line)) {
            (_, Input::Quit) => break,
            (Phase::Show, Input::Reveal) => session.reveal().map(|_| ()),
            (Phase::Reveal, Input::Rate(rating)) => session.rate(rating).await.map(|_| ()),
            (Phase::Done, Input::Restart) => session.restart().await,
            (_, Input::Next) => session.next().map(|_| ()),
            (_, Input::Previous) => session.previous().map(|_| ()),
            (_, Input::Unknown) => {
                println!("{}", terminal::paint("Unrecognized input", Color::YELLOW, use_color));
                Ok(())
            }
            (Phase::Done, _) => {
                println!("Session complete. Type r to restart or q to quit.");
                Ok(())
            }
            (Phase::Show, _) => {
                println!("Press Enter to show the answer first.");
                Ok(())
            }
            (Phase::Reveal, _) => {
                println!("Rate the card: 1 Again, 2 Hard, 3 Good, 4 Easy.");
                Ok(())
            }
        };

        match outcome {
            Ok(()) => {}
            Err(SessionError::EmptyQueue(_)) => {
                println!("No cards left in this scope.");
                break;
            }
            Err(e @ SessionError::Persistence { .. }) => {
                log::error!("{}", e);
                println!(
                    "{}",
                    terminal::paint(&format!("{}. Rate again to retry.", e), Color::RED, use_color)
                );
            }
            Err(e) => println!("{}", terminal::paint(&e.to_string(), Color::YELLOW, use_color)),
        }
    }

    println!("Reviewed {} cards.", session.reviewed());
    Ok(())
}

fn print_state(app: &App, session: &StudySession, use_color: bool) {
    println!();
    let Some(card) = session.current() else {
        println!(
            "{}",
            terminal::paint("Session complete.", Color::GREEN, use_color)
        );
        println!("{}", terminal::paint("[r] restart all cards  [q] quit", Color::DIM, use_color));
        return;
    };

    let (position, total) = session.progress();
    println!("{}", terminal::paint(&format!("{} / {}", position, total), Color::GRAY, use_color));
    println!("{}", terminal::paint(&card.front, Color::BOLD, use_color));

    match session.phase() {
        Phase::Show => {
            println!(
                "{}",
                terminal::paint("[Enter] show answer  [n] next  [p] previous  [q] quit", Color::DIM, use_color)
            );
        }
        Phase::Reveal => {
            println!("{}", card.back);
            if let Some(note) = &card.note {
                println!("{}", terminal::paint(note, Color::DIM, use_color));
            }
            if session.current_is_rated() {
                println!("{}", terminal::paint("Already rated this session. [n] next", Color::DIM, use_color));
                return;
            }
            let previews = preview_intervals(card, &app.config.scheduler);
            let buttons: Vec<String> = ReviewRating::ALL
                .iter()
                .zip(previews.iter())
                .enumerate()
                .map(|(i, (rating, days))| format!("[{}] {} ({})", i + 1, rating, format_interval(*days)))
                .collect();
            println!("{}", buttons.join("  "));
        }
        Phase::Done => {}
    }
}
