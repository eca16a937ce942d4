//! Terminal `sending_results` turn: per-recipient cards and email drafts.

use std::cell::{Cell, RefCell};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use url::Url;

use crate::api::routes::Endpoints;
use crate::api::types::SendingResult;
use crate::ui::hit;

const DEFAULT_SUBJECT: &str = "Жалоба";
const SHORT_BODY_CHARS: usize = 500;
const SHORT_BODY_SUFFIX: &str = "\n\n[Полный текст в прикреплённом PDF]";
const PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsAction {
    Ignored,
    Consumed,
    OpenEmail(usize),
    RequestRestart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultsRow {
    Card(usize),
    Restart,
}

/// Cards for every recipient plus the "new complaint" action.
#[derive(Debug, Clone)]
pub struct ResultsView {
    results: Vec<SendingResult>,
    pdf_links: Vec<Option<Url>>,
    pdf_download_url: Option<String>,
    /// `results.len()` is the restart row
    cursor: usize,
    scroll: Cell<usize>,
    rows: RefCell<Vec<(Rect, ResultsRow)>>,
}

impl ResultsView {
    pub fn new(results: Vec<SendingResult>, pdf_download_url: Option<String>, endpoints: &Endpoints) -> Self {
        let pdf_links = results
            .iter()
            .map(|result| {
                let key = result.artifact_key();
                (!key.is_empty()).then(|| endpoints.download_pdf(key))
            })
            .collect();
        Self {
            results,
            pdf_links,
            pdf_download_url,
            cursor: 0,
            scroll: Cell::new(0),
            rows: RefCell::new(Vec::new()),
        }
    }

    pub fn results(&self) -> &[SendingResult] {
        &self.results
    }

    pub fn result(&self, index: usize) -> Option<&SendingResult> {
        self.results.get(index)
    }

    pub fn pdf_link(&self, index: usize) -> Option<&Url> {
        self.pdf_links.get(index).and_then(Option::as_ref)
    }

    fn activate(&self, row: ResultsRow) -> ResultsAction {
        match row {
            ResultsRow::Restart => ResultsAction::RequestRestart,
            ResultsRow::Card(index) => match self.results.get(index) {
                Some(result) if EmailDraft::from_result(result).is_some() => ResultsAction::OpenEmail(index),
                _ => ResultsAction::Consumed,
            },
        }
    }

    fn cursor_row(&self) -> ResultsRow {
        if self.cursor < self.results.len() {
            ResultsRow::Card(self.cursor)
        } else {
            ResultsRow::Restart
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ResultsAction {
        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                ResultsAction::Consumed
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(self.results.len());
                ResultsAction::Consumed
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < self.results.len() {
                    self.cursor = index;
                }
                ResultsAction::Consumed
            }
            KeyCode::Char('e') | KeyCode::Char('у') => match self.cursor_row() {
                ResultsRow::Card(_) => self.activate(self.cursor_row()),
                ResultsRow::Restart => ResultsAction::Consumed,
            },
            KeyCode::Enter => self.activate(self.cursor_row()),
            _ => ResultsAction::Ignored,
        }
    }

    pub fn click(&mut self, column: u16, row: u16) -> ResultsAction {
        let target = self
            .rows
            .borrow()
            .iter()
            .find(|(area, _)| hit(*area, column, row))
            .map(|(_, target)| *target);
        match target {
            Some(target) => {
                self.cursor = match target {
                    ResultsRow::Card(index) => index,
                    ResultsRow::Restart => self.results.len(),
                };
                self.activate(target)
            }
            None => ResultsAction::Ignored,
        }
    }

    fn card_lines(&self, index: usize, result: &SendingResult, focused: bool) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::Gray);
        let mut lines = Vec::new();

        let header_style = if focused {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(
            format!("{}. {}", index + 1, result.display_name()),
            header_style,
        )));
        if let Some(link) = self.pdf_link(index) {
            lines.push(Line::from(vec![
                Span::styled("   📄 PDF: ", dim),
                Span::styled(link.to_string(), Style::default().fg(Color::Cyan)),
            ]));
        }

        if let Some(address) = &result.address {
            lines.push(Line::from(Span::styled(format!("   📍 {}", address), dim)));
        }
        if let Some(phone) = &result.phone {
            lines.push(Line::from(Span::styled(format!("   📞 {}", phone), dim)));
        }
        if let Some(hours) = &result.working_hours {
            lines.push(Line::from(Span::styled(format!("   🕐 {}", hours), dim)));
        }
        if let Some(time) = &result.processing_time {
            lines.push(Line::from(Span::styled(format!("   Срок ответа: {}", time), dim)));
        }

        lines.push(Line::from(Span::styled(
            "   Портал (рекомендуется)",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        match &result.website {
            Some(website) => {
                for benefit in ["✓ Быстрее рассмотрение", "✓ Отслеживание статуса"] {
                    lines.push(Line::from(Span::styled(format!("     {}", benefit), dim)));
                }
                let auth = match &result.auth_required {
                    Some(auth) => format!("     🔐 Требуется авторизация: {}", auth),
                    None => "     ✓ Часто без регистрации".to_string(),
                };
                lines.push(Line::from(Span::styled(auth, Style::default().fg(Color::Yellow))));
                let name = result.portal_name.as_deref().unwrap_or("Перейти на портал");
                lines.push(Line::from(Span::styled(
                    format!("     🌐 Портал: {} ({})", name, website),
                    Style::default().fg(Color::Cyan),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "     ✗ Портал не найден",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        lines.push(Line::from(Span::styled(
            "   Email",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )));
        match &result.email {
            Some(email) => {
                lines.push(Line::from(Span::styled(format!("     📧 {}", email), dim)));
                lines.push(Line::from(Span::styled(
                    format!("     ✉ Написать письмо: Enter или /email {}", index + 1),
                    Style::default().fg(Color::Cyan),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "     ✗ Email не найден",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        if !result.documents_needed.is_empty() {
            lines.push(Line::from(Span::styled("   Приложите к обращению (если есть):", dim)));
            for doc in &result.documents_needed {
                lines.push(Line::from(Span::styled(format!("     • {}", doc), dim)));
            }
        }
        if let Some(tips) = &result.tips {
            lines.push(Line::from(Span::styled(
                format!("   💡 Совет: {}", tips),
                Style::default().fg(Color::Green),
            )));
        }
        lines
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
            .title(" ✓ Жалоба готова ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let mut lines: Vec<(ResultsRow, Line<'static>)> = Vec::new();
        let mut cursor_span = (0, 0);
        for (index, result) in self.results.iter().enumerate() {
            let start = lines.len();
            for line in self.card_lines(index, result, focused && index == self.cursor) {
                lines.push((ResultsRow::Card(index), line));
            }
            if index == self.cursor {
                cursor_span = (start, lines.len());
            }
            lines.push((ResultsRow::Card(index), Line::default()));
        }

        let tip = match &self.pdf_download_url {
            Some(url) => format!("PDF для всех получателей: {}", url),
            None => "Скачайте PDF и приложите его к обращению на портале или в письме.".to_string(),
        };
        lines.push((ResultsRow::Restart, Line::from(Span::styled(tip, Style::default().fg(Color::DarkGray)))));

        let restart_style = if focused && self.cursor == self.results.len() {
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        };
        if self.cursor == self.results.len() {
            cursor_span = (lines.len(), lines.len() + 1);
        }
        lines.push((ResultsRow::Restart, Line::from(Span::styled("[ 📝 Новая жалоба ]", restart_style))));

        let height = inner.height as usize;
        let mut scroll = self.scroll.get().min(lines.len().saturating_sub(1));
        if cursor_span.0 < scroll {
            scroll = cursor_span.0;
        } else if cursor_span.1 > scroll + height {
            scroll = cursor_span.1.saturating_sub(height).min(cursor_span.0);
        }
        self.scroll.set(scroll);

        let mut rows = self.rows.borrow_mut();
        rows.clear();
        for (i, (target, line)) in lines.iter().skip(scroll).take(height).enumerate() {
            let rect = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
            buf.set_line(rect.x, rect.y, line, rect.width);
            rows.push((rect, *target));
        }
    }
}

/// Pre-filled email to one recipient, with webmail compose links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub to: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub mailto: String,
}

impl EmailDraft {
    /// `None` when the recipient has neither an address nor a mailto link.
    pub fn from_result(result: &SendingResult) -> Option<Self> {
        let mailto = result
            .mailto_link
            .clone()
            .filter(|link| link.starts_with("mailto:"))
            .or_else(|| result.email.as_ref().map(|email| format!("mailto:{}", email)))?;

        let (address, subject, body) = match Url::parse(&mailto) {
            Ok(parsed) => {
                let mut subject = None;
                let mut body = None;
                for (key, value) in parsed.query_pairs() {
                    match key.as_ref() {
                        "subject" => subject = Some(value.into_owned()),
                        "body" => body = Some(value.into_owned()),
                        _ => {}
                    }
                }
                let address = percent_decode(parsed.path());
                (address, subject, body)
            }
            Err(_) => (String::new(), None, None),
        };

        let to = result
            .email
            .clone()
            .filter(|email| !email.is_empty())
            .unwrap_or(address);

        Some(Self {
            to,
            recipient_name: result.display_name().to_string(),
            subject: subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: body.unwrap_or_default(),
            mailto,
        })
    }

    /// Body truncated for webmail URLs, with a pointer to the PDF.
    pub fn short_body(&self) -> String {
        if self.body.chars().count() <= SHORT_BODY_CHARS {
            return self.body.clone();
        }
        let mut short: String = self.body.chars().take(SHORT_BODY_CHARS).collect();
        short.push_str(SHORT_BODY_SUFFIX);
        short
    }

    pub fn gmail_url(&self) -> String {
        let body = self.short_body();
        self.compose_url(
            "https://mail.google.com/mail/",
            &[("view", "cm"), ("to", self.to.as_str()), ("su", self.subject.as_str()), ("body", body.as_str())],
        )
    }

    pub fn yandex_url(&self) -> String {
        let body = self.short_body();
        self.compose_url(
            "https://mail.yandex.ru/compose",
            &[("to", self.to.as_str()), ("subject", self.subject.as_str()), ("body", body.as_str())],
        )
    }

    pub fn mailru_url(&self) -> String {
        let body = self.short_body();
        self.compose_url(
            "https://e.mail.ru/compose/",
            &[("to", self.to.as_str()), ("subject", self.subject.as_str()), ("body", body.as_str())],
        )
    }

    fn compose_url(&self, base: &str, params: &[(&str, &str)]) -> String {
        Url::parse_with_params(base, params)
            .map(String::from)
            .unwrap_or_else(|_| self.mailto.clone())
    }
}

fn percent_decode(text: &str) -> String {
    url::form_urlencoded::parse(format!("a={}", text.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| text.to_string())
}

impl Widget for &EmailDraft {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" ✉ Письмо: {} (Esc - закрыть) ", self.recipient_name));

        let label = Style::default().fg(Color::DarkGray);
        let link = Style::default().fg(Color::Cyan);
        let preview: String = self.body.chars().take(PREVIEW_CHARS).collect();

        let mut lines = vec![
            Line::from(vec![Span::styled("Кому: ", label), Span::raw(self.to.clone())]),
            Line::from(vec![Span::styled("Тема: ", label), Span::raw(self.subject.clone())]),
            Line::default(),
        ];
        if !preview.is_empty() {
            lines.push(Line::from(Span::styled(
                if preview.len() < self.body.len() { format!("{}…", preview) } else { preview },
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            "Откройте письмо в почтовом сервисе:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (name, url) in [
            ("Gmail", self.gmail_url()),
            ("Яндекс", self.yandex_url()),
            ("Mail.ru", self.mailru_url()),
            ("Почтовая программа", self.mailto.clone()),
        ] {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", name), label),
                Span::styled(url, link),
            ]));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
