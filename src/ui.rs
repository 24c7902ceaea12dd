use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use wordfall::game::{LoseReport, LossReason};

use crate::{App, AppState};

const PALETTE: [Color; 7] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
];

struct Areas {
    status: Rect,
    field: Rect,
    input: Rect,
}

fn split(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);
    Areas {
        status: chunks[0],
        field: chunks[1],
        input: chunks[2],
    }
}

/// Inner rectangle of the play field for a given frame size. The game's
/// arena is sized to match it.
pub fn play_area(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(split(area).field)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Playing => render_game(self, area, buf),
            AppState::GameOver(report) => render_game_over(self, report, area, buf),
        }
    }
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let areas = split(area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    // status bar
    let mut status = vec![
        Span::styled(format!("WPM: {}", session.wpm()), bold),
        Span::raw("  "),
        Span::raw(format!("Accuracy: {}%", session.accuracy())),
        Span::raw("  "),
        Span::raw(format!(
            "Missed: {}/{}",
            session.metrics().missed,
            session.missed_threshold()
        )),
        Span::raw("  "),
        Span::raw(format!("Level {}", session.difficulty().level() + 1)),
    ];
    if let Some(lives) = session.lives() {
        let full = "♥".repeat(lives.lives() as usize);
        let empty = "♡".repeat(lives.max().saturating_sub(lives.lives()) as usize);
        status.push(Span::raw("  "));
        status.push(Span::styled(full, Style::default().fg(Color::Red)));
        status.push(Span::styled(empty, dim));
    }
    Paragraph::new(Line::from(status)).render(areas.status, buf);

    // play field
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" wordfall · {} ", session.mode()));
    let field = block.inner(areas.field);
    block.render(areas.field, buf);

    let typed = session.typing().input();
    let target = session.typing().target();
    for (id, word) in session.registry().iter() {
        let x = field.x.saturating_add(word.x.max(0.0).floor() as u16);
        let y = field.y.saturating_add(word.y.max(0.0).floor() as u16);
        if x >= field.right() || y >= field.bottom() {
            continue;
        }
        let room = (field.right() - x) as usize;
        let is_target = Some(id) == target;
        let style = if is_target {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        buf.set_stringn(x, y, &word.text, room, style);

        // colour the part already typed
        if is_target && !typed.is_empty() && word.text.to_lowercase().starts_with(typed) {
            let prefix: String = word.text.chars().take(typed.chars().count()).collect();
            buf.set_stringn(x, y, prefix, room, Style::default().fg(Color::Green).patch(bold));
        }
    }

    for particle in &app.effects.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = field.x.saturating_add(particle.x as u16);
        let y = field.y.saturating_add(particle.y as u16);
        if x >= field.right() || y >= field.bottom() {
            continue;
        }
        let mut style = Style::default().fg(PALETTE[particle.color_index % PALETTE.len()]);
        if particle.opacity < 0.4 {
            style = style.add_modifier(Modifier::DIM);
        }
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_char(particle.symbol).set_style(style);
        }
    }

    for flash in &app.effects.flashes {
        let x = field.x.saturating_add(flash.x.max(0.0) as u16);
        let y = field.y.saturating_add(flash.y.max(0.0) as u16);
        if x < field.right() && y < field.bottom() {
            let room = (field.right() - x) as usize;
            buf.set_stringn(x, y, "BOOM!", room, Style::default().fg(Color::Red).patch(bold));
        }
    }

    let avatar = session.avatar();
    let ax = field.x.saturating_add(avatar.x.max(0.0) as u16);
    let ay = field.y.saturating_add(avatar.y.max(0.0) as u16);
    if ax < field.right() && ay < field.bottom() {
        buf.set_string(ax, ay, "@", Style::default().fg(Color::Cyan).patch(bold));
    }

    // input line
    let hint = if session.feed().is_empty() && session.feed().is_refilling() {
        Span::styled("  fetching words…", dim.add_modifier(Modifier::ITALIC))
    } else {
        Span::raw("")
    };
    let input = Paragraph::new(Line::from(vec![
        Span::styled(typed.to_string(), bold),
        Span::styled("_", dim),
        hint,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" type + space ")
            .title_alignment(Alignment::Right),
    );
    input.render(areas.input, buf);
}

fn defeat_line(app: &App, report: &LoseReport) -> String {
    match report.reason {
        LossReason::OutOfLives => "You were defeated after running out of lives".to_string(),
        LossReason::LowAccuracy { .. } => format!(
            "You were defeated due to less than {}% accuracy",
            app.config.accuracy_floor
        ),
        LossReason::TooManyMisses { threshold } => {
            format!("You were defeated due to missing more than {threshold} words")
        }
    }
}

fn render_game_over(app: &App, report: &LoseReport, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let lines = vec![
        Line::from(Span::styled(
            "Game Over!",
            Style::default().fg(Color::Red).patch(bold),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("WPM: {}", report.wpm), bold)),
        Line::from(format!("Accuracy: {}%", report.accuracy)),
        Line::from(format!("Missed Words: {}", report.missed)),
        Line::from(""),
        Line::from(Span::styled(defeat_line(app, report), Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled("Press Space to Restart", italic)),
        Line::from(Span::styled("(esc)ape to quit", italic.add_modifier(Modifier::DIM))),
    ];

    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
