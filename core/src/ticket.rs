//! Fixed-layout booking ticket.
//!
//! The layout is expressed as a list of [`DrawOp`]s in millimetres with the
//! origin at the top-left corner of a 100 x 160 page. A [`TicketRenderer`]
//! turns the list into a printable document.

use tracing::{info, warn};

use crate::config::BookingConfig;
use crate::deep_link::messaging_link;
use crate::handoff::{HandoffError, TicketViewModel};

pub const PAGE_WIDTH_MM: f32 = 100.0;
pub const PAGE_HEIGHT_MM: f32 = 160.0;

pub const GOLD: Rgb = Rgb(212, 175, 55);
pub const DARK: Rgb = Rgb(10, 10, 10);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const GREY: Rgb = Rgb(80, 80, 80);
pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const TEAR_OFF: Rgb = Rgb(200, 200, 200);

pub const FOOTER_NOTE: &str = "Submit this ticket with your payment slip.";
pub const STAMP_LABEL: &str = "WAITING FOR VERIFICATION";
pub const PRECONDITION_ALERT: &str = "No booking data found. Please fill the form first.";

const ELLIPSIS: &str = "...";
const LEFT_COLUMN_X: f32 = 15.0;
const RIGHT_COLUMN_X: f32 = 65.0;
const CENTER_X: f32 = PAGE_WIDTH_MM / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    CourierBold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size_pt: f32,
    pub color: Rgb,
    pub align: Align,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    StrokeRect {
        rect: Rect,
        color: Rgb,
        width: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        width: f32,
        dash: Option<Dash>,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
}

/// Character budgets for values drawn on the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPolicy {
    pub id: usize,
    pub full_name: usize,
    pub service: usize,
    pub whatsapp: usize,
    pub dob: usize,
    pub tob: usize,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            id: 16,
            full_name: 34,
            service: 34,
            whatsapp: 34,
            dob: 22,
            tob: 22,
        }
    }
}

/// Cuts `value` to at most `budget` characters, ending in `...` when cut.
pub fn fit_to_budget(value: &str, budget: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= budget {
        return value.to_string();
    }
    if budget <= ELLIPSIS.len() {
        return value.chars().take(budget).collect();
    }
    let mut out: String = value.chars().take(budget - ELLIPSIS.len()).collect();
    out.truncate(out.trim_end().len());
    out.push_str(ELLIPSIS);
    out
}

struct Layout {
    ops: Vec<DrawOp>,
}

impl Layout {
    fn fill(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke(&mut self, rect: Rect, color: Rgb, width: f32) {
        self.ops.push(DrawOp::StrokeRect { rect, color, width });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, width: f32, dash: Option<Dash>) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color,
            width,
            dash,
        });
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, font: Font, size_pt: f32, color: Rgb, align: Align) {
        self.ops.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            style: TextStyle {
                font,
                size_pt,
                color,
                align,
            },
        });
    }

    fn labeled_row(&mut self, y: &mut f32, label: &str, value: String) {
        self.text(label.to_uppercase(), LEFT_COLUMN_X, *y, Font::HelveticaBold, 8.0, GOLD, Align::Left);
        *y += 5.0;
        self.text(value, LEFT_COLUMN_X, *y, Font::Helvetica, 10.0, BLACK, Align::Left);
        *y += 9.0;
    }
}

pub fn layout_ticket(
    view: &TicketViewModel,
    config: &BookingConfig,
    policy: &LayoutPolicy,
) -> Vec<DrawOp> {
    let mut layout = Layout { ops: Vec::new() };

    layout.fill(Rect::new(0.0, 0.0, PAGE_WIDTH_MM, PAGE_HEIGHT_MM), WHITE);
    layout.stroke(Rect::new(5.0, 5.0, 90.0, 150.0), GOLD, 1.0);
    layout.stroke(Rect::new(7.0, 7.0, 86.0, 146.0), GOLD, 0.3);

    layout.fill(Rect::new(5.0, 5.0, 90.0, 35.0), DARK);
    layout.text(&config.provider_name, CENTER_X, 18.0, Font::HelveticaBold, 14.0, GOLD, Align::Center);
    layout.text(&config.tagline, CENTER_X, 26.0, Font::Helvetica, 8.0, WHITE, Align::Center);
    layout.line((25.0, 30.0), (75.0, 30.0), GOLD, 0.3, None);

    let mut y = 50.0;
    layout.text("BOOKING REFERENCE:", CENTER_X, y, Font::HelveticaBold, 9.0, DARK, Align::Center);
    y += 6.0;
    layout.text(fit_to_budget(&view.id, policy.id), CENTER_X, y, Font::CourierBold, 12.0, DARK, Align::Center);
    y += 15.0;

    layout.labeled_row(&mut y, "Client Name", fit_to_budget(&view.full_name, policy.full_name));
    layout.labeled_row(&mut y, "Service Type", fit_to_budget(&view.service, policy.service));
    layout.labeled_row(&mut y, "WhatsApp", fit_to_budget(&view.whatsapp, policy.whatsapp));

    layout.text("DOB", LEFT_COLUMN_X, y, Font::HelveticaBold, 8.0, GOLD, Align::Left);
    layout.text("TIME", RIGHT_COLUMN_X, y, Font::HelveticaBold, 8.0, GOLD, Align::Left);
    y += 5.0;
    layout.text(fit_to_budget(&view.dob, policy.dob), LEFT_COLUMN_X, y, Font::Helvetica, 8.0, BLACK, Align::Left);
    layout.text(fit_to_budget(&view.tob, policy.tob), RIGHT_COLUMN_X, y, Font::Helvetica, 8.0, BLACK, Align::Left);

    layout.line(
        (5.0, 135.0),
        (95.0, 135.0),
        TEAR_OFF,
        0.3,
        Some(Dash { on: 2.0, off: 2.0 }),
    );
    layout.text(FOOTER_NOTE, CENTER_X, 142.0, Font::Helvetica, 7.0, GREY, Align::Center);

    layout.fill(Rect::new(30.0, 146.0, 40.0, 6.0), GOLD);
    layout.text(STAMP_LABEL, CENTER_X, 150.0, Font::HelveticaBold, 6.0, DARK, Align::Center);

    layout.ops
}

/// `Ticket_{name}.pdf` with characters that are unsafe in file names
/// replaced by `_`.
pub fn ticket_file_name(full_name: &str) -> String {
    let name: String = full_name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    format!("Ticket_{name}.pdf")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RenderFailure(pub String);

/// Drawing backend for the ticket.
pub trait TicketRenderer {
    fn is_available(&self) -> bool {
        true
    }

    fn render(&self, ops: &[DrawOp], title: &str) -> Result<Vec<u8>, RenderFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Precondition(#[from] HandoffError),
    #[error("ticket renderer is unavailable")]
    RendererUnavailable,
    #[error("ticket rendering failed: {0}")]
    Render(#[from] RenderFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTicket {
    pub view: TicketViewModel,
    pub file_name: String,
    pub document: Vec<u8>,
    pub messaging_link: String,
}

pub fn prepare_ticket<R: TicketRenderer>(
    view: TicketViewModel,
    config: &BookingConfig,
    renderer: &R,
) -> Result<PreparedTicket, TicketError> {
    if !renderer.is_available() {
        return Err(TicketError::RendererUnavailable);
    }
    let ops = layout_ticket(&view, config, &LayoutPolicy::default());
    let title = format!("Booking {}", view.id);
    let document = renderer.render(&ops, &title)?;
    Ok(PreparedTicket {
        file_name: ticket_file_name(&view.full_name),
        messaging_link: messaging_link(&config.recipient, &config.provider_greeting, &view),
        document,
        view,
    })
}

/// Page-level effects of the ticket page.
pub trait TicketHost {
    fn alert(&self, message: &str);
    fn navigate(&self, url: &str);
    fn save(&self, file_name: &str, bytes: &[u8]);
    fn set_messaging_link(&self, url: &str);
}

/// Runs once on ticket page load. Any precondition or render failure sends
/// the user back to the form.
pub fn run_ticket_page<H: TicketHost, R: TicketRenderer>(
    host: &H,
    renderer: &R,
    query: &str,
    config: &BookingConfig,
) -> Result<PreparedTicket, TicketError> {
    let prepared = TicketViewModel::from_query(query)
        .map_err(TicketError::from)
        .and_then(|view| prepare_ticket(view, config, renderer));
    match prepared {
        Ok(ticket) => {
            info!(id = %ticket.view.id, file = %ticket.file_name, "ticket ready");
            host.save(&ticket.file_name, &ticket.document);
            host.set_messaging_link(&ticket.messaging_link);
            Ok(ticket)
        }
        Err(err) => {
            warn!(error = %err, "ticket page precondition failed");
            host.alert(PRECONDITION_ALERT);
            host.navigate(&config.form_path);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> TicketViewModel {
        TicketViewModel {
            id: "BK-11111".to_string(),
            full_name: "Kasun Jayawardena".to_string(),
            whatsapp: "0771234567".to_string(),
            dob: "1988-02-29".to_string(),
            tob: "23:10".to_string(),
            service: "Marriage Compatibility".to_string(),
            ..TicketViewModel::default()
        }
    }

    fn texts(ops: &[DrawOp]) -> Vec<(&str, f32, f32)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn budget_truncates_with_ellipsis() {
        assert_eq!(fit_to_budget("short", 10), "short");
        assert_eq!(fit_to_budget("abcdefghijkl", 8), "abcde...");
        assert_eq!(fit_to_budget("abcd efghijkl", 8), "abcd...");
        assert_eq!(fit_to_budget("abcdef", 2), "ab");
        assert_eq!(fit_to_budget("ශ්‍රී ලංකා ජනරජය", 6).chars().count(), 6);
    }

    #[test]
    fn rows_land_on_fixed_positions() {
        let ops = layout_ticket(&view(), &BookingConfig::default(), &LayoutPolicy::default());
        let texts = texts(&ops);
        assert!(texts.contains(&("BK-11111", 50.0, 56.0)));
        assert!(texts.contains(&("CLIENT NAME", 15.0, 71.0)));
        assert!(texts.contains(&("Kasun Jayawardena", 15.0, 76.0)));
        assert!(texts.contains(&("SERVICE TYPE", 15.0, 85.0)));
        assert!(texts.contains(&("WHATSAPP", 15.0, 99.0)));
        assert!(texts.contains(&("DOB", 15.0, 113.0)));
        assert!(texts.contains(&("23:10", 65.0, 118.0)));
        assert!(texts.contains(&(STAMP_LABEL, 50.0, 150.0)));
    }

    #[test]
    fn tear_off_line_is_dashed() {
        let ops = layout_ticket(&view(), &BookingConfig::default(), &LayoutPolicy::default());
        let dashed = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { dash: Some(_), .. }))
            .count();
        assert_eq!(dashed, 1);
        let borders = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
            .count();
        assert_eq!(borders, 2);
    }

    #[test]
    fn long_names_are_cut_to_budget() {
        let mut long = view();
        long.full_name = "A".repeat(80);
        let policy = LayoutPolicy::default();
        let ops = layout_ticket(&long, &BookingConfig::default(), &policy);
        let name = texts(&ops)
            .into_iter()
            .find(|(_, _, y)| *y == 76.0)
            .map(|(text, _, _)| text.to_string())
            .expect("name row");
        assert_eq!(name.chars().count(), policy.full_name);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn file_name_replaces_unsafe_characters() {
        assert_eq!(ticket_file_name("Nimal Perera"), "Ticket_Nimal Perera.pdf");
        assert_eq!(ticket_file_name("a/b\\c:d*e?"), "Ticket_a_b_c_d_e_.pdf");
        assert_eq!(ticket_file_name("x\ny"), "Ticket_x_y.pdf");
    }
}
