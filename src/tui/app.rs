//! Main TUI application: input box, board, and HUD around one turn controller.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use shakmaty::{Color, Position};

use crate::engine::StrengthSetting;
use crate::game::{Phase, TurnController};
use crate::input_handler::{InputLine, UserInput};
use crate::rules::move_squares;
use crate::tui::board_widget::{BoardWidget, Highlights};
use crate::tui::Theme;

/// Move-list rows kept on screen; older rows scroll off the top.
const HISTORY_ROWS: usize = 12;

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

fn strength_label(setting: Option<StrengthSetting>) -> String {
    match setting {
        Some(StrengthSetting::Rating(rating)) => format!("rating {}", rating),
        Some(StrengthSetting::SkillLevel(level)) => format!("skill level {}", level),
        Some(StrengthSetting::Unavailable) => "full strength (no control)".to_string(),
        None => "-".to_string(),
    }
}

/// Main TUI application
pub struct TuiApp {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    theme: Theme,
    input: InputLine,
    status: Option<String>,
    should_quit: bool,
}

impl TuiApp {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            theme: Theme::default(),
            input: InputLine::default(),
            status: None,
            should_quit: false,
        })
    }

    /// Runs the frame loop until the user quits: wait up to one frame for a
    /// key, advance the controller by one tick, redraw.
    pub fn run(&mut self, controller: &mut TurnController, fps: u32) -> io::Result<()> {
        let frame = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        self.terminal.clear()?;

        while !self.should_quit {
            if event::poll(frame)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(controller, key.code);
                    }
                }
            }

            controller.tick();

            let view: &TurnController = controller;
            let theme = &self.theme;
            let typed = self.input.as_str();
            let status = self.status.as_deref();
            self.terminal.draw(|f| {
                Self::render_frame(f, view, theme, typed, status);
            })?;
        }
        Ok(())
    }

    fn handle_key(&mut self, controller: &mut TurnController, code: crossterm::event::KeyCode) {
        let input = match self.input.handle_key(code) {
            None => return,
            Some(Ok(input)) => input,
            Some(Err(error)) => {
                self.status = Some(error.to_string());
                return;
            }
        };
        self.status = None;

        match input {
            UserInput::Click(square) => controller.click(square),
            UserInput::Move { from, to } => controller.submit_move(from, to),
            UserInput::Reset => {
                let human = controller.state().human_color;
                controller.reset(human);
            }
            UserInput::SwapColors => {
                let human = controller.state().human_color;
                controller.reset(!human);
            }
            UserInput::Quit => self.should_quit = true,
        }
    }

    fn render_frame(
        frame: &mut ratatui::Frame,
        controller: &TurnController,
        theme: &Theme,
        typed: &str,
        status: Option<&str>,
    ) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(size);

        let board_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        let state = controller.state();
        let highlights = Highlights {
            selection: state.selection,
            targets: state.legal_targets.clone(),
            previews: state
                .pending_previews
                .iter()
                .flatten()
                .filter_map(|(m, _)| move_squares(*m))
                .flat_map(|(from, to)| [from, to])
                .collect(),
            last_move: state.last_move().and_then(move_squares),
        };
        let board_widget = BoardWidget::new(state.game.position().board(), theme, &highlights)
            .flipped(state.human_color == Color::Black);
        frame.render_widget(board_widget, board_chunks[0]);

        Self::render_info_panel(frame, board_chunks[1], controller, theme);
        Self::render_input_panel(frame, main_chunks[1], controller, theme, typed, status);
    }

    fn render_info_panel(
        frame: &mut ratatui::Frame,
        area: Rect,
        controller: &TurnController,
        theme: &Theme,
    ) {
        let state = controller.state();
        let profile = controller.profile();
        let mut info_text = String::new();

        info_text.push_str(&format!("Target strength: {}\n", profile.target_strength));
        info_text.push_str(&format!(
            "Engine: {}\n",
            strength_label(controller.session().applied_strength())
        ));
        info_text.push_str(&format!(
            "You are: {} (engine plays {})\n",
            color_name(state.human_color),
            color_name(state.engine_color())
        ));
        let outcomes: Vec<String> = profile
            .recent_outcomes
            .iter()
            .map(|o| format!("{:.1}", o))
            .collect();
        info_text.push_str(&format!("Recent results: [{}]\n\n", outcomes.join(", ")));

        match state.ending {
            Some(ending) => info_text.push_str(&format!(
                "Game over: {} ({})\n",
                ending.describe(),
                ending.result_str()
            )),
            None => {
                let check = if state.game.is_check() { " (check)" } else { "" };
                info_text.push_str(&format!("Turn: {}{}\n", color_name(state.game.turn()), check));
            }
        }

        match state.last_move_delta {
            Some(delta) => info_text.push_str(&format!("Last move delta: {:+} cp\n", delta)),
            None if !state.move_history.is_empty() => {
                info_text.push_str("Last move delta: unknown\n")
            }
            None => {}
        }
        if let Some(hint) = state.last_engine_hint {
            info_text.push_str(&format!("Engine's last move: {:+} cp\n", hint));
        }
        if let Some(previews) = &state.pending_previews {
            let lines: Vec<String> = previews
                .iter()
                .map(|(m, cp)| format!("{} {:+}", state.game.san(*m), cp))
                .collect();
            if !lines.is_empty() {
                info_text.push_str(&format!("Engine considers: {}\n", lines.join(", ")));
            }
        }
        if let Some(commentary) = &state.latest_commentary {
            info_text.push_str(&format!("Coach: {}\n", commentary));
        }

        let history = &state.notation_history;
        if !history.is_empty() {
            info_text.push_str("\nMove History:\n");
            info_text.push_str("  # │ White      │ Black\n");
            info_text.push_str("  ──┼────────────┼────────────\n");

            let rows = (history.len() + 1) / 2;
            for row in rows.saturating_sub(HISTORY_ROWS)..rows {
                let white = &history[row * 2];
                match history.get(row * 2 + 1) {
                    Some(black) => info_text.push_str(&format!(
                        " {:>2} │ {:<10} │ {:<10}\n",
                        row + 1,
                        white,
                        black
                    )),
                    None => info_text.push_str(&format!(" {:>2} │ {:<10} │\n", row + 1, white)),
                }
            }
        }

        let paragraph = Paragraph::new(info_text)
            .block(Block::default().borders(Borders::ALL).title("Game Info"))
            .wrap(Wrap { trim: false })
            .style(theme.text_style());

        frame.render_widget(paragraph, area);
    }

    fn render_input_panel(
        frame: &mut ratatui::Frame,
        area: Rect,
        controller: &TurnController,
        theme: &Theme,
        typed: &str,
        status: Option<&str>,
    ) {
        let prompt_text = match controller.phase() {
            Phase::GameOver => ":r to play again, :c to swap colors, :q to quit".to_string(),
            Phase::AwaitingHuman => match controller.state().selection {
                Some(square) => format!("{} selected, to: {}_", square, typed),
                None => format!("Your move: {}_", typed),
            },
            Phase::AiPreviewPending | Phase::AiToMove => "Engine is thinking...".to_string(),
        };
        let prompt_text = match status {
            Some(status) => format!("{}  ({})", prompt_text, status),
            None => prompt_text,
        };

        let paragraph = Paragraph::new(prompt_text)
            .block(Block::default().borders(Borders::ALL).title("Input"))
            .style(theme.text_style());

        frame.render_widget(paragraph, area);
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        if let Err(error) = disable_raw_mode() {
            warn!("failed to leave raw mode: {}", error);
        }
        if let Err(error) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {}", error);
        }
        let _ = self.terminal.show_cursor();
    }
}
