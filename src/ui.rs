// File: src/ui.rs
//! Keyboard-driven terminal browser on top of [`Catalog`].

use crate::core::engine::{Catalog, Intent, Outcome, View};
use crate::core::types::{Nutrition, ALL};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::info;

/// Poll timeout when no search pass is pending.
const IDLE_POLL: Duration = Duration::from_secs(30);

const DISCLAIMER: &[&str] = &[
    "Nutrition values are extracted automatically from the published",
    "nutrition PDF and may contain errors. Check the official source",
    "before relying on them.",
    "",
    "Press y or Enter to accept, q to quit.",
];

const INSTALL_HINT: &str = "Tip: `cargo install --path .` puts `catalog` on your PATH.";

const HELP: &str =
    "type to search | Tab size | Shift-Tab milk | Up/Down move | Enter star | Ctrl-D clear favorites | Esc clear/quit";

/// One selectable (drink, size, milk) line, from search results or favorites.
#[derive(Debug, Clone, Copy)]
struct Row<'a> {
    drink_id: &'a str,
    drink_name: &'a str,
    size: &'a str,
    milk_type: &'a str,
    nutrition: &'a Nutrition,
}

pub struct Browser {
    catalog: Catalog,
    selected: usize,
    status: Option<String>,
}

impl Browser {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            selected: 0,
            status: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn rows<'a>(view: &View<'a>) -> Vec<Row<'a>> {
        if let Some(favorites) = view.favorites {
            return favorites
                .iter()
                .map(|f| Row {
                    drink_id: &f.drink_id,
                    drink_name: &f.drink_name,
                    size: &f.size,
                    milk_type: &f.milk_type,
                    nutrition: &f.nutrition,
                })
                .collect();
        }

        view.results
            .iter()
            .flat_map(|drink| {
                drink.sizes.iter().flat_map(move |size| {
                    size.milk_variants.iter().map(move |variant| Row {
                        drink_id: &drink.id,
                        drink_name: &drink.name,
                        size: &size.size,
                        milk_type: &variant.milk_type,
                        nutrition: &variant.nutrition,
                    })
                })
            })
            .collect()
    }

    /// Applies one key press. Returns `false` when the browser should exit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return false;
        }

        let view = self.catalog.view();
        if view.show_disclaimer {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.catalog.dispatch(Intent::AcceptDisclaimer, now);
                    if self.catalog.take_install_prompt() {
                        self.status = Some(INSTALL_HINT.to_string());
                    }
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => false,
                _ => true,
            };
        }

        if view.confirm_clear {
            let intent = match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Intent::ConfirmClearFavorites,
                _ => Intent::CancelClearFavorites,
            };
            if self.catalog.dispatch(intent, now) == Outcome::Cleared {
                self.status = Some("Favorites cleared.".to_string());
                self.selected = 0;
            }
            return true;
        }

        let input = view.input.to_string();
        self.status = None;

        match key.code {
            KeyCode::Esc if input.is_empty() => return false,
            KeyCode::Esc => self.search(String::new(), now),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.catalog.dispatch(Intent::RequestClearFavorites, now) == Outcome::Ignored {
                    self.status = Some("No favorites to clear.".to_string());
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut text = input;
                text.push(c);
                self.search(text, now);
            }
            KeyCode::Backspace => {
                let mut text = input;
                text.pop();
                self.search(text, now);
            }
            KeyCode::Tab => self.cycle_size(now),
            KeyCode::BackTab => self.cycle_milk(now),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected += 1,
            KeyCode::Enter => self.toggle_selected(now),
            _ => {}
        }
        self.clamp_selection();
        true
    }

    fn search(&mut self, text: String, now: Instant) {
        self.catalog.dispatch(Intent::SearchInput(text), now);
        self.selected = 0;
    }

    fn cycle_size(&mut self, now: Instant) {
        let Some(facets) = self.catalog.view().facets else {
            return;
        };
        let next = next_value(&facets.sizes, &facets.selected_size);
        self.catalog.dispatch(Intent::SelectSize(next), now);
    }

    fn cycle_milk(&mut self, now: Instant) {
        let Some(facets) = self.catalog.view().facets else {
            return;
        };
        let next = next_value(&facets.milk_types, &facets.selected_milk);
        self.catalog.dispatch(Intent::SelectMilk(next), now);
    }

    fn toggle_selected(&mut self, now: Instant) {
        let view = self.catalog.view();
        let Some(row) = Self::rows(&view).get(self.selected).copied() else {
            return;
        };
        let intent = Intent::ToggleFavorite {
            drink_id: row.drink_id.to_string(),
            size: row.size.to_string(),
            milk_type: row.milk_type.to_string(),
        };
        let label = format!("{} / {} / {}", row.drink_name, row.size, row.milk_type);

        self.status = match self.catalog.dispatch(intent, now) {
            Outcome::Starred(_) => Some(format!("Starred {label}")),
            Outcome::Unstarred => Some(format!("Removed {label}")),
            _ => None,
        };
    }

    fn clamp_selection(&mut self) {
        let count = Self::rows(&self.catalog.view()).len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    /// Screen contents, top to bottom, cut to `height` lines.
    pub fn lines(&self, height: usize) -> Vec<String> {
        let view = self.catalog.view();
        let mut lines = vec![self.header()];

        if view.show_disclaimer {
            lines.push(String::new());
            lines.extend(DISCLAIMER.iter().map(|l| l.to_string()));
            lines.truncate(height);
            return lines;
        }

        lines.push(format!("Search: {}_", view.input));
        if let Some(facets) = &view.facets {
            lines.push(format!(
                "Size: {}   Milk: {}",
                facet_line(&facets.sizes, &facets.selected_size),
                facet_line(&facets.milk_types, &facets.selected_milk)
            ));
        }
        lines.push(String::new());

        let rows = Self::rows(&view);
        match (&view.favorites, rows.is_empty()) {
            (Some(_), true) => lines.push("Type to search. Starred variants are listed here.".to_string()),
            (Some(_), false) => lines.push(format!("Favorites ({})", rows.len())),
            (None, true) if view.results.is_empty() => lines.push("No drinks match.".to_string()),
            (None, _) => {}
        }

        for (i, row) in rows.iter().enumerate() {
            let cursor = if i == self.selected { '>' } else { ' ' };
            let star = if self.catalog.is_starred(row.drink_id, row.size, row.milk_type) {
                '*'
            } else {
                ' '
            };
            lines.push(format!(
                "{cursor}{star} {} | {} | {}   {}",
                row.drink_name,
                row.size,
                row.milk_type,
                row.nutrition.display("calories")
            ));
        }

        let unmatched: Vec<&str> = view
            .results
            .iter()
            .filter(|d| !d.has_variants())
            .map(|d| d.name.as_str())
            .collect();
        if !unmatched.is_empty() {
            lines.push(format!(
                "  No variant fits both filters: {}",
                unmatched.join(", ")
            ));
        }

        if let Some(row) = rows.get(self.selected) {
            lines.push(String::new());
            lines.push(format!("{} ({}, {})", row.drink_name, row.size, row.milk_type));
            for (label, value) in row.nutrition.rows() {
                lines.push(format!("  {label:<16}{value}"));
            }
        }

        // Footer stays visible: trim the body first.
        let footer = if view.confirm_clear {
            format!(
                "Clear all {} favorites? y confirms, any other key cancels.",
                self.catalog.favorites().len()
            )
        } else {
            self.status.clone().unwrap_or_else(|| HELP.to_string())
        };
        lines.truncate(height.saturating_sub(1));
        lines.push(footer);
        lines
    }

    fn header(&self) -> String {
        let dataset = self.catalog.dataset();
        let mut header = format!("Nutrition Catalog: {} drinks", dataset.drinks.len());
        if let Some(at) = &dataset.metadata.extracted_at {
            header.push_str(&format!(", extracted {at}"));
        }
        header
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        queue!(out, Clear(ClearType::All))?;
        for (y, line) in self.lines(height as usize).iter().enumerate() {
            let clipped: String = line.chars().take(width as usize).collect();
            queue!(out, cursor::MoveTo(0, y as u16), Print(clipped))?;
        }
        out.flush()
    }

    fn event_loop(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.catalog.take_install_prompt() {
            self.status = Some(INSTALL_HINT.to_string());
        }
        loop {
            self.draw(out)?;
            let timeout = self
                .catalog
                .next_deadline(Instant::now())
                .unwrap_or(IDLE_POLL);

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if !self.handle_key(key, Instant::now()) {
                        return Ok(());
                    }
                }
            }
            if self.catalog.tick(Instant::now()) {
                self.clamp_selection();
            }
        }
    }
}

/// Runs the browser until the user quits, restoring the terminal on the way out.
pub fn run(catalog: Catalog) -> io::Result<()> {
    let mut browser = Browser::new(catalog);
    let mut stdout = io::stdout();

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let result = browser.event_loop(&mut stdout);
    browser.catalog.flush();
    execute!(stdout, cursor::Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    info!("browser closed after {} filter passes", browser.catalog.filter_passes());
    result
}

fn next_value(values: &[String], current: &str) -> String {
    let pos = values.iter().position(|v| v == current).unwrap_or(0);
    values
        .get((pos + 1) % values.len().max(1))
        .cloned()
        .unwrap_or_else(|| ALL.to_string())
}

fn facet_line(values: &[String], selected: &str) -> String {
    values
        .iter()
        .map(|v| if v == selected { format!("[{v}]") } else { v.clone() })
        .collect::<Vec<_>>()
        .join(" ")
}
