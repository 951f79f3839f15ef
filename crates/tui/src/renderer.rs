use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use heap_replay_core::{ReplayConfig, ReplaySession, severity, views::CommandSurface};
use heap_replay_protocol::{Point, ThemeToken, Viewport};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::raster;

const SPEEDS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];
const POLL: Duration = Duration::from_millis(50);

/// Screen regions, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Areas {
    header: Rect,
    caption: Rect,
    tree: Rect,
    array: Rect,
    steps: Rect,
    legend: Rect,
    log: Rect,
    footer: Rect,
}

impl Areas {
    fn split(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(8), Constraint::Length(1)])
            .split(area);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(38)])
            .split(rows[1]);
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(5), Constraint::Length(5)])
            .split(cols[0]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(8), Constraint::Length(8)])
            .split(cols[1]);
        Self {
            header: rows[0],
            caption: main[0],
            tree: main[1],
            array: main[2],
            steps: side[0],
            legend: side[1],
            log: side[2],
            footer: rows[2],
        }
    }

    /// Inside of the bordered tree and array blocks, as surface viewports.
    fn viewports(&self) -> (Viewport, Viewport) {
        let inner = |r: Rect| {
            let r = Block::default().borders(Borders::ALL).inner(r);
            Viewport {
                x: f64::from(r.x),
                y: f64::from(r.y),
                width: f64::from(r.width),
                height: f64::from(r.height),
            }
        };
        (inner(self.tree), inner(self.array))
    }
}

pub struct App {
    session: ReplaySession<CommandSurface>,
    source: Option<PathBuf>,
    areas: Areas,
    steps: ListState,
    hovering: Option<usize>,
    dark: bool,
    quit: bool,
}

impl App {
    pub fn new(config: ReplayConfig, source: Option<PathBuf>) -> Self {
        let dark = config.view.dark;
        let areas = Areas::default();
        let (tree, array) = areas.viewports();
        Self {
            session: ReplaySession::new(CommandSurface::cells(tree, array), config),
            source,
            areas,
            steps: ListState::default(),
            hovering: None,
            dark,
            quit: false,
        }
    }

    /// Re-read the snapshot file and start a fresh replay.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        let data =
            std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        self.session
            .load_bytes(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        self.hovering = None;
        Ok(())
    }

    /// Lay the screen out for `area`; the surface follows on size changes.
    pub fn relayout(&mut self, area: Rect) {
        let areas = Areas::split(area);
        if areas == self.areas {
            return;
        }
        self.areas = areas;
        let (tree, array) = areas.viewports();
        self.session.surface_mut().set_viewports(tree, array);
        self.session.resize();
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char(' ') => self.session.toggle(),
            KeyCode::Left => self.session.step_backward(),
            KeyCode::Right => self.session.step_forward(),
            KeyCode::Home => self.session.reset(),
            KeyCode::End => self.session.seek_last(),
            KeyCode::Char('+' | '=') => self.shift_speed(true),
            KeyCode::Char('-') => self.shift_speed(false),
            KeyCode::Char('r') => {
                if let Err(e) = self.reload() {
                    tracing::warn!("reload failed: {e:#}");
                }
            }
            KeyCode::Tab => {
                if self.session.is_active() {
                    self.session.deactivate();
                } else {
                    self.session.activate();
                }
                self.hovering = None;
            }
            _ => {}
        }
    }

    fn shift_speed(&mut self, faster: bool) {
        let speed = self.session.status().speed;
        let next = if faster {
            SPEEDS.iter().copied().find(|&s| s > speed + f64::EPSILON)
        } else {
            SPEEDS.iter().rev().copied().find(|&s| s < speed - f64::EPSILON)
        };
        if let Some(next) = next {
            self.session.set_speed(next);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = Point::new(f64::from(mouse.column) + 0.5, f64::from(mouse.row) + 0.5);
        let slot = if self.session.is_active() {
            self.session.surface().slot_at(point).map(|(_, i)| i)
        } else {
            None
        };
        match mouse.kind {
            MouseEventKind::Moved => match slot {
                Some(i) if self.hovering != Some(i) => {
                    self.hovering = Some(i);
                    self.session.hover(i);
                }
                None if self.hovering.is_some() => {
                    self.hovering = None;
                    self.session.pointer_leave();
                }
                _ => {}
            },
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = slot {
                    self.hovering = None;
                    self.session.click(i);
                } else if let Some(step) = self.step_at(mouse.column, mouse.row) {
                    self.session.seek_step(step);
                }
            }
            _ => {}
        }
    }

    /// Step-list entry under a screen cell.
    fn step_at(&self, column: u16, row: u16) -> Option<usize> {
        let inner = Block::default().borders(Borders::ALL).inner(self.areas.steps);
        if !inner.contains((column, row).into()) {
            return None;
        }
        let step = self.steps.offset() + usize::from(row - inner.y);
        (step + 1 < self.session.frames().len()).then_some(step)
    }

    fn draw(&mut self, frame: &mut Frame) {
        let areas = self.areas;
        self.draw_header(frame, areas.header);
        self.draw_caption(frame, areas.caption);

        let tree_block = Block::default().borders(Borders::ALL).title(" Heap tree ");
        let array_block = Block::default().borders(Borders::ALL).title(" Heap array ");
        frame.render_widget(tree_block, areas.tree);
        frame.render_widget(array_block, areas.array);

        if self.session.is_active() && !self.session.frames().is_empty() {
            let clip = areas.tree.union(areas.array);
            let commands = self.session.surface().commands();
            raster::rasterize(&commands, frame.buffer_mut(), clip, self.dark);
        } else {
            let hint = if self.session.is_active() {
                "No steps to replay"
            } else {
                "Visualization hidden (Tab to show)"
            };
            let inner = Block::default().borders(Borders::ALL).inner(areas.tree);
            frame.render_widget(
                Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
                inner,
            );
        }

        self.draw_steps(frame, areas.steps);
        self.draw_legend(frame, areas.legend);
        self.draw_log(frame, areas.log);
        self.draw_footer(frame, areas.footer);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let status = self.session.status();
        let text = format!(
            " heap-replay | {} | {}× | Space play/pause  ←→ step  Home/End  +/- speed  r reload  Tab hide  q quit ",
            status.status.label(),
            status.speed,
        );
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            area,
        );
    }

    fn draw_caption(&self, frame: &mut Frame, area: Rect) {
        let model = self.session.surface().model().filter(|_| self.session.is_active());
        let lines = match model {
            Some(m) => vec![
                Line::from(Span::styled(
                    m.description.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    m.detail.clone().unwrap_or_default(),
                    Style::default().fg(Color::Gray),
                )),
            ],
            None => vec![Line::from("")],
        };
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn draw_steps(&mut self, frame: &mut Frame, area: Rect) {
        let frames = self.session.frames();
        let items: Vec<ListItem> = frames
            .iter()
            .filter_map(|f| {
                let step = f.step_index?;
                Some(ListItem::new(format!("{:>2}. {}", step + 1, f.description)))
            })
            .collect();
        let current_step = self
            .session
            .status()
            .current
            .and_then(|i| frames.get(i))
            .and_then(|f| f.step_index);
        self.steps.select(current_step);

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Steps "))
            .highlight_style(
                Style::default()
                    .bg(raster::theme_to_color(ThemeToken::StepActive, self.dark))
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_stateful_widget(list, area, &mut self.steps);
    }

    fn draw_legend(&self, frame: &mut Frame, area: Rect) {
        let stats = self.session.stats();
        let lines: Vec<Line> = severity::legend()
            .into_iter()
            .map(|entry| {
                let count = stats.buckets.get(entry.label.as_str()).copied().unwrap_or(0);
                let color = raster::theme_to_color(entry.display_class().theme_token(), self.dark);
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(color)),
                    Span::raw(format!("{:<5} {:<11} {count:>3}", entry.range, entry.label.as_str())),
                ])
            })
            .collect();
        let title = format!(" Severity ({} waiting) ", stats.total);
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
    }

    fn draw_log(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .snapshot()
            .logs
            .iter()
            .map(|l| ListItem::new(format!("{} {}", l.time, l.message)))
            .collect();
        frame.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title(" Log ")),
            area,
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let status = self.session.status();
        let position = match status.current {
            Some(i) => format!("{}/{}", i + 1, status.total),
            None => format!("0/{}", status.total),
        };
        let source = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!(" Frame {position}  {source}"))
                .style(Style::default().fg(Color::Gray)),
            area,
        );
    }
}

pub fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut last = Instant::now();
    while !app.quit {
        let size = terminal.size()?;
        app.relayout(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|frame| app.draw(frame))?;

        if event::poll(POLL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key.code),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        let now = Instant::now();
        app.session.advance(now - last);
        last = now;
    }
    Ok(())
}
