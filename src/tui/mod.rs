//! Interactive terminal view over a running server.
//!
//! Renders a [`ViewController`]: login screen, material list with a search
//! bar, and the add/edit/adjust modals. Keys:
//! `/` search, `Tab` cycle search field, `Enter` adjust quantity, `a` add,
//! `e` edit, `d` delete, `r` reload, `o` log out, `q` quit.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph},
    DefaultTerminal, Frame,
};
use std::time::Duration;

use crate::cli::Cli;
use crate::client::ApiClient;
use crate::inventory::{Material, MaterialFormData};
use crate::search::display_date;
use crate::view::{Modal, ViewController, ViewError};

const FORM_LABELS: [&str; 6] = [
    "Name",
    "Quantity",
    "Unit",
    "Category",
    "Reorder Point",
    "Image URL",
];

pub async fn run(cli: &Cli) -> Result<()> {
    let client = ApiClient::new(&cli.api_url).context("Failed to create HTTP client")?;
    let mut app = TuiApp::new(ViewController::new(client));
    app.login_form.username = cli.username.clone().unwrap_or_default();
    app.login_form.password = cli.password.clone().unwrap_or_default();

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();
    result
}

#[derive(Debug, Default)]
struct LoginForm {
    username: String,
    password: String,
    on_password: bool,
}

/// Text fields backing the add/edit modal
#[derive(Debug, Default)]
struct MaterialForm {
    fields: [String; 6],
    focus: usize,
}

impl MaterialForm {
    fn from_material(material: &Material) -> Self {
        Self {
            fields: [
                material.name.clone(),
                material.quantity.to_string(),
                material.unit.clone(),
                material.category.clone(),
                material.reorder_point.to_string(),
                material.image_url.clone().unwrap_or_default(),
            ],
            focus: 0,
        }
    }

    /// Non-numeric quantities read as zero, like an empty number input
    fn to_form_data(&self) -> MaterialFormData {
        let image_url = self.fields[5].trim();
        MaterialFormData {
            name: self.fields[0].clone(),
            quantity: self.fields[1].trim().parse().unwrap_or(0),
            unit: self.fields[2].clone(),
            category: self.fields[3].clone(),
            reorder_point: self.fields[4].trim().parse().unwrap_or(0),
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
        }
    }

    fn focused(&mut self) -> &mut String {
        &mut self.fields[self.focus]
    }
}

struct TuiApp {
    view: ViewController<ApiClient>,
    login_form: LoginForm,
    list_state: ListState,
    searching: bool,
    form: MaterialForm,
    adjustment: i64,
    confirm_delete: Option<Material>,
    status: Option<String>,
    quit: bool,
}

impl TuiApp {
    fn new(view: ViewController<ApiClient>) -> Self {
        Self {
            view,
            login_form: LoginForm::default(),
            list_state: ListState::default(),
            searching: false,
            form: MaterialForm::default(),
            adjustment: 0,
            confirm_delete: None,
            status: None,
            quit: false,
        }
    }

    async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.quit {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                    }
                }
            }
        }
        Ok(())
    }

    fn selected(&self) -> Option<Material> {
        let visible = self.view.visible();
        self.list_state
            .selected()
            .and_then(|i| visible.get(i).cloned())
    }

    /// Keep the selection inside the visible list
    fn clamp_selection(&mut self) {
        let len = self.view.visible().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    fn report(&mut self, result: Result<(), ViewError>) {
        self.status = result.err().map(|e| e.to_string());
        self.clamp_selection();
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if !self.view.is_logged_in() {
            self.handle_login_key(key).await;
            return;
        }

        if let Some(material) = self.confirm_delete.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                let result = self.view.delete(&material.id).await;
                self.report(result);
            }
            return;
        }

        match self.view.modal() {
            Modal::Add | Modal::Edit(_) => self.handle_form_key(key).await,
            Modal::Adjust(_) => self.handle_adjust_key(key).await,
            Modal::None if self.searching => self.handle_search_key(key),
            Modal::None => self.handle_list_key(key).await,
        }
    }

    async fn handle_login_key(&mut self, key: KeyEvent) {
        let form = &mut self.login_form;
        let field = if form.on_password {
            &mut form.password
        } else {
            &mut form.username
        };

        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.on_password = !form.on_password
            }
            KeyCode::Backspace => {
                field.pop();
            }
            KeyCode::Char(c) => field.push(c),
            KeyCode::Enter => {
                let (username, password) = (form.username.clone(), form.password.clone());
                let result = self.view.login(&username, &password).await;
                self.report(result);
                if self.view.is_logged_in() {
                    self.login_form.password.clear();
                }
            }
            _ => {}
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) {
        self.status = None;
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Tab => {
                let next = self.view.search_field().next();
                self.view.set_search_field(next);
                self.clamp_selection();
            }
            KeyCode::Down | KeyCode::Char('j') => self.list_state.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.list_state.select_previous(),
            KeyCode::Char('a') => {
                self.form = MaterialForm::default();
                let result = self.view.open_add();
                self.report(result);
            }
            KeyCode::Char('e') => {
                if let Some(material) = self.selected() {
                    self.form = MaterialForm::from_material(&material);
                    let result = self.view.open_edit(&material.id);
                    self.report(result);
                }
            }
            KeyCode::Enter => {
                if let Some(material) = self.selected() {
                    self.adjustment = 0;
                    let result = self.view.open_adjust(&material.id);
                    self.report(result);
                }
            }
            KeyCode::Char('d') => self.confirm_delete = self.selected(),
            KeyCode::Char('r') => {
                let result = self.view.reload().await;
                self.report(result);
            }
            KeyCode::Char('o') => {
                self.view.logout();
                self.list_state.select(None);
            }
            KeyCode::Esc => self.view.dismiss_notice(),
            _ => {}
        }
        self.clamp_selection();
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut query = self.view.query().to_string();
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => self.searching = false,
            KeyCode::Tab => {
                let next = self.view.search_field().next();
                self.view.set_search_field(next);
            }
            KeyCode::Backspace => {
                query.pop();
                self.view.search(&query);
            }
            KeyCode::Char(c) => {
                query.push(c);
                self.view.search(&query);
            }
            _ => {}
        }
        self.clamp_selection();
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.view.close_modal(),
            KeyCode::Tab | KeyCode::Down => {
                self.form.focus = (self.form.focus + 1) % FORM_LABELS.len()
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.focus = (self.form.focus + FORM_LABELS.len() - 1) % FORM_LABELS.len()
            }
            KeyCode::Backspace => {
                self.form.focused().pop();
            }
            KeyCode::Char(c) => self.form.focused().push(c),
            KeyCode::Enter => {
                let data = self.form.to_form_data();
                let result = match self.view.modal() {
                    Modal::Add => self.view.submit_add(data).await,
                    _ => self.view.submit_edit(data).await,
                };
                self.report(result);
            }
            _ => {}
        }
    }

    async fn handle_adjust_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.view.close_modal(),
            KeyCode::Char('+') | KeyCode::Right | KeyCode::Up => {
                self.adjustment = self.adjustment.saturating_add(1)
            }
            KeyCode::Char('-') | KeyCode::Left | KeyCode::Down => {
                self.adjustment = self.adjustment.saturating_sub(1)
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let digit = i64::from(c as u8 - b'0');
                let sign = if self.adjustment < 0 { -1 } else { 1 };
                self.adjustment = self
                    .adjustment
                    .saturating_mul(10)
                    .saturating_add(sign * digit);
            }
            KeyCode::Backspace => self.adjustment /= 10,
            KeyCode::Enter => {
                let result = self.view.submit_adjust(self.adjustment).await;
                self.adjustment = 0;
                self.report(result);
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        if !self.view.is_logged_in() {
            self.draw_login(frame);
            return;
        }

        let [header, search, list, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let user = match self.view.session() {
            crate::view::Session::LoggedIn { username } => username.as_str(),
            _ => "",
        };
        frame.render_widget(
            Line::from(vec![
                Span::styled("Inventory Management", Style::new().bold().fg(Color::Blue)),
                Span::raw(format!("  signed in as {}", user)),
            ]),
            header,
        );

        let search_style = if self.searching {
            Style::new().fg(Color::Yellow)
        } else {
            Style::new()
        };
        frame.render_widget(
            Paragraph::new(self.view.query().to_string()).block(
                Block::bordered()
                    .title(format!(" Search materials by {} ", self.view.search_field().label()))
                    .border_style(search_style),
            ),
            search,
        );

        let items: Vec<ListItem> = self
            .view
            .visible()
            .iter()
            .map(|m| {
                ListItem::new(vec![
                    Line::from(Span::styled(m.name.clone(), Style::new().bold())),
                    Line::from(format!(
                        "  Quantity: {} {}   Category: {}   Updated: {}",
                        m.quantity,
                        m.unit,
                        m.category,
                        display_date(&chrono::Local, &m.last_updated)
                    )),
                ])
            })
            .collect();
        let list_widget = List::new(items)
            .block(Block::bordered().title(" Materials "))
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list_widget, list, &mut self.list_state);

        let footer_text = if let Some(material) = &self.confirm_delete {
            Line::from(format!(
                "Are you sure you want to delete {}? (y/n)",
                material.name
            ))
            .fg(Color::Red)
        } else if let Some(message) = self.status.as_deref().or(self.view.notice()) {
            Line::from(message.to_string()).fg(Color::Red)
        } else {
            Line::from("/ search  Tab field  Enter adjust  a add  e edit  d delete  r reload  o log out  q quit")
                .fg(Color::DarkGray)
        };
        frame.render_widget(footer_text, footer);

        match self.view.modal() {
            Modal::Add => self.draw_form(frame, " Add New Material "),
            Modal::Edit(_) => self.draw_form(frame, " Edit Material "),
            Modal::Adjust(material) => self.draw_adjust(frame, material),
            Modal::None => {}
        }
    }

    fn draw_login(&self, frame: &mut Frame) {
        let area = centered(frame.area(), 50, 8);
        let form = &self.login_form;
        let focus = |on: bool| {
            if on {
                Style::new().fg(Color::Yellow)
            } else {
                Style::new()
            }
        };

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Username: "),
                Span::styled(form.username.clone(), focus(!form.on_password)),
            ]),
            Line::from(vec![
                Span::raw("Password: "),
                Span::styled("*".repeat(form.password.chars().count()), focus(form.on_password)),
            ]),
            Line::from(""),
        ];
        if let Some(error) = self.view.login_error().or(self.status.as_deref()) {
            lines.push(Line::from(error.to_string()).fg(Color::Red));
        }

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Sign in (Enter to log in, Esc to quit) ")),
            area,
        );
    }

    fn draw_form(&self, frame: &mut Frame, title: &str) {
        let area = centered(frame.area(), 60, FORM_LABELS.len() as u16 + 4);
        let lines: Vec<Line> = FORM_LABELS
            .iter()
            .zip(self.form.fields.iter())
            .enumerate()
            .map(|(i, (label, value))| {
                let style = if i == self.form.focus {
                    Style::new().fg(Color::Yellow)
                } else {
                    Style::new()
                };
                Line::from(vec![
                    Span::raw(format!("{:<14}", label)),
                    Span::styled(value.clone(), style),
                ])
            })
            .chain(std::iter::once(Line::from("")))
            .chain(std::iter::once(
                Line::from("Enter save  Tab next field  Esc cancel").fg(Color::DarkGray),
            ))
            .collect();

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(Block::bordered().title(title)), area);
    }

    fn draw_adjust(&self, frame: &mut Frame, material: &Material) {
        let area = centered(frame.area(), 50, 7);
        let lines = vec![
            Line::from(Span::styled(material.name.clone(), Style::new().bold())),
            Line::from(format!(
                "Current quantity: {} {}",
                material.quantity, material.unit
            )),
            Line::from(format!(
                "Adjustment: {:+}  ->  {}",
                self.adjustment,
                material.quantity.saturating_add(self.adjustment)
            )),
            Line::from("+/- step  digits type  Enter update  Esc close").fg(Color::DarkGray),
        ];

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Adjust Quantity ")),
            area,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_form_round_trips_material_fields() {
        let material = Material {
            id: "1".to_string(),
            name: "Steel Plates".to_string(),
            quantity: 500,
            unit: "pieces".to_string(),
            category: "Metal".to_string(),
            reorder_point: 100,
            last_updated: Utc::now(),
            image_url: None,
        };

        let form = MaterialForm::from_material(&material);
        assert_eq!(form.to_form_data(), material.form_data());
    }

    #[test]
    fn test_form_reads_bad_numbers_as_zero() {
        let mut form = MaterialForm::default();
        form.fields[1] = "lots".to_string();
        form.fields[4] = " 7 ".to_string();

        let data = form.to_form_data();
        assert_eq!(data.quantity, 0);
        assert_eq!(data.reorder_point, 7);
        assert_eq!(data.image_url, None);
    }

    #[test]
    fn test_centered_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered(area, 60, 4);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.y, 3);
    }
}
