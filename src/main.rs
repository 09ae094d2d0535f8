use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use mcquiz::app::{App, AppScreen, Feedback};
use mcquiz::catalog;
use mcquiz::config::Config;
use mcquiz::event::{AppEvent, EventSource};
use mcquiz::quiz::result::format_clock;
use mcquiz::store::{JsonStore, KeyValueStore, MemoryStore, ScoreStore};
use mcquiz::ui;
use mcquiz::ui::components::progress_bar::ProgressBar;
use mcquiz::ui::components::question_card::QuestionCard;
use mcquiz::ui::components::results::Results;
use mcquiz::ui::components::select_list::{ListItem, SelectList};
use mcquiz::ui::layout::AppLayout;
use mcquiz::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "mcquiz",
    version,
    about = "Terminal multiple-choice quiz runner with timed, shuffled sessions"
)]
struct Cli {
    #[arg(short, long, help = "Question catalog JSON file (replaces bundled questions)")]
    catalog: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Maximum number of questions per quiz")]
    max_questions: Option<usize>,

    #[arg(short, long, help = "Seconds allowed per question")]
    seconds_per_question: Option<u32>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "List available themes and exit")]
    list_themes: bool,

    #[arg(long, help = "Save the effective settings to the config file and exit")]
    write_config: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    if cli.list_themes {
        for name in Theme::available_themes() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable config");
        Config::default()
    });
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(n) = cli.max_questions {
        config.max_questions = n;
    }
    if let Some(secs) = cli.seconds_per_question {
        config.seconds_per_question = secs;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    config.normalize();

    if cli.write_config {
        config.save()?;
        println!("Wrote {}", Config::config_path().display());
        return Ok(());
    }

    let catalog =
        catalog::load(config.catalog_path.as_deref()).context("Error loading subject data")?;

    let theme: &'static Theme =
        Box::leak(Box::new(Theme::load(&config.theme).unwrap_or_default()));

    let backend: Box<dyn KeyValueStore> = match JsonStore::new() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "best scores will not be saved this session");
            Box::new(MemoryStore::default())
        }
    };

    let mut app = App::new(
        catalog,
        config,
        theme,
        ScoreStore::new(backend),
        SmallRng::from_entropy(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventSource::new(Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Logging is opt-in through `MCQUIZ_LOG` (an `EnvFilter` directive) and goes
/// to a file, since the terminal belongs to the UI.
fn init_logging() {
    let Ok(directive) = std::env::var("MCQUIZ_LOG") else {
        return;
    };
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcquiz");
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mcquiz.log"))
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventSource,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next(app.next_deadline())? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick | AppEvent::Resize => {}
        }
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::SubjectSelect => handle_subject_key(app, key),
        AppScreen::TopicSelect => handle_topic_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Results => handle_results_key(app, key),
    }
}

fn handle_subject_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.select_subject(),
        _ => {}
    }
}

fn handle_topic_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
            app.back_to_subjects()
        }
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Enter => app.start_quiz(),
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_quiz(),
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            app.choose_option(index);
        }
        KeyCode::Up | KeyCode::Char('k') if !app.question_verified() => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') if !app.question_verified() => app.cursor_down(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if app.question_verified() {
                app.next_question();
            } else {
                app.choose_highlighted();
            }
        }
        KeyCode::Char('n') if app.question_verified() => app.next_question(),
        KeyCode::Char('s') => app.next_question(),
        _ => {}
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.restart_quiz(),
        KeyCode::Enter | KeyCode::Char('n') => app.new_quiz(),
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::SubjectSelect => render_subjects(frame, app),
        AppScreen::TopicSelect => render_topics(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::Results => render_results(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, info: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " mcquiz ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, hints: &str) {
    let footer = Paragraph::new(Line::from(Span::styled(
        hints.to_string(),
        Style::default().fg(app.theme.colors.muted()),
    )));
    frame.render_widget(footer, area);
}

fn render_subjects(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    render_header(frame, app, layout.header, "| Choose a subject");

    let items = app
        .subjects()
        .into_iter()
        .map(|s| ListItem {
            label: s.to_string(),
            badge: None,
        })
        .collect();
    let list = SelectList::new("Subjects", items, app.subject_selected, app.theme)
        .subtitle(app.notice.clone());
    frame.render_widget(list, ui::layout::centered_rect(50, 80, layout.main));

    render_footer(frame, app, layout.footer, " [j/k] Move  [Enter] Select  [q] Quit ");
}

fn render_topics(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    let subject = app.subject.clone().unwrap_or_default();
    render_header(frame, app, layout.header, &format!("| {subject}"));

    let items = app
        .topics()
        .into_iter()
        .map(|topic| ListItem {
            label: topic.to_string(),
            badge: Some(match app.best_score(topic) {
                Some(best) => format!("Best: {best}%"),
                None => "New".to_string(),
            }),
        })
        .collect();

    let status = match app.highlighted_topic() {
        Some(topic) => Some(match app.best_score(&topic) {
            Some(best) => format!("Selected: {topic} (Best score: {best}%)"),
            None => format!("Selected: {topic} (New topic)"),
        }),
        None => Some("Select a topic to start a quiz.".to_string()),
    };

    let list = SelectList::new(&subject, items, app.topic_selected, app.theme)
        .subtitle(status)
        .empty_text("No topics found for this subject.");
    frame.render_widget(list, ui::layout::centered_rect(60, 80, layout.main));

    render_footer(
        frame,
        app,
        layout.footer,
        " [j/k] Move  [Enter] Start quiz  [Esc] Back to subjects  [q] Quit ",
    );
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let colors = &app.theme.colors;
    let layout = AppLayout::new(frame.area());

    let header_info = format!(
        "| {} / {} | Score {} / {} | ",
        session.subject(),
        session.topic(),
        session.score(),
        session.total(),
    );
    let remaining = session.time_remaining();
    let timer_color = if remaining <= 10 {
        colors.incorrect()
    } else {
        colors.accent()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " mcquiz ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
        Span::styled(
            format_clock(remaining),
            Style::default()
                .fg(timer_color)
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6)])
        .split(layout.main);

    frame.render_widget(
        ProgressBar::new("Progress", session.progress_percent(), app.theme),
        main_layout[0],
    );
    frame.render_widget(
        QuestionCard::new(
            session,
            app.option_selected,
            app.feedback.as_ref(),
            app.theme,
        ),
        main_layout[1],
    );

    let hints = if session.is_verified() {
        " [Enter/n] Next question  [Esc] Exit quiz "
    } else {
        " [1-9] Answer  [j/k + Enter] Pick  [s] Skip  [Esc] Exit quiz "
    };
    render_footer(frame, app, layout.footer, hints);
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    if let Some(ref result) = app.last_result {
        let centered = ui::layout::centered_rect(60, 70, frame.area());
        let banner = app.feedback.as_ref().map(Feedback::message);
        frame.render_widget(
            Results::new(result, app.last_best, app.theme).banner(banner),
            centered,
        );
    }
}
