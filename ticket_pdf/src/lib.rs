//! PDF backend for the booking ticket.
//!
//! Draw operations arrive in top-left-origin millimetres and are flipped onto
//! the bottom-left origin PDF uses.

use astro_booking_core::ticket::{
    Align, Dash, DrawOp, Font, Rect, Rgb, TextStyle, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use astro_booking_core::{RenderFailure, TicketRenderer};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, LineDashPattern, Mm, PdfDocument,
    PdfLayerReference, Point,
};
use tracing::debug;

const PT_TO_MM: f32 = 0.352_778;
const MM_TO_PT: f32 = 1.0 / PT_TO_MM;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("font setup failed: {0}")]
    Font(String),
    #[error("pdf serialization failed: {0}")]
    Save(String),
}

impl From<RenderError> for RenderFailure {
    fn from(err: RenderError) -> Self {
        RenderFailure(err.to_string())
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono_bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Helvetica => &self.regular,
            Font::HelveticaBold => &self.bold,
            Font::CourierBold => &self.mono_bold,
        }
    }
}

/// Renders ticket layouts with the standard PDF fonts, so no font files are
/// needed at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTicketRenderer;

impl PdfTicketRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_pdf(&self, ops: &[DrawOp], title: &str) -> Result<Vec<u8>, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Ticket");
        let layer = doc.get_page(page).get_layer(layer);

        let builtin = |font| {
            doc.add_builtin_font(font)
                .map_err(|err| RenderError::Font(err.to_string()))
        };
        let fonts = Fonts {
            regular: builtin(BuiltinFont::Helvetica)?,
            bold: builtin(BuiltinFont::HelveticaBold)?,
            mono_bold: builtin(BuiltinFont::CourierBold)?,
        };

        for op in ops {
            draw(&layer, &fonts, op);
        }
        debug!(ops = ops.len(), title, "ticket drawn");

        doc.save_to_bytes()
            .map_err(|err| RenderError::Save(err.to_string()))
    }
}

impl TicketRenderer for PdfTicketRenderer {
    fn render(&self, ops: &[DrawOp], title: &str) -> Result<Vec<u8>, RenderFailure> {
        Ok(self.render_pdf(ops, title)?)
    }
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::FillRect { rect, color } => {
            layer.set_fill_color(pdf_color(*color));
            layer.add_rect(pdf_rect(rect).with_mode(PaintMode::Fill));
        }
        DrawOp::StrokeRect { rect, color, width } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(width * MM_TO_PT);
            layer.add_rect(pdf_rect(rect).with_mode(PaintMode::Stroke));
        }
        DrawOp::Line {
            from,
            to,
            color,
            width,
            dash,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(width * MM_TO_PT);
            if let Some(dash) = dash {
                layer.set_line_dash_pattern(dash_pattern(*dash));
            }
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(from.0), Mm(flip_y(from.1))), false),
                    (Point::new(Mm(to.0), Mm(flip_y(to.1))), false),
                ],
                is_closed: false,
            });
            if dash.is_some() {
                layer.set_line_dash_pattern(LineDashPattern::default());
            }
        }
        DrawOp::Text { text, x, y, style } => {
            let x = match style.align {
                Align::Left => *x,
                Align::Center => x - text_width_mm(text, style) / 2.0,
            };
            layer.set_fill_color(pdf_color(style.color));
            layer.use_text(
                text.as_str(),
                style.size_pt,
                Mm(x),
                Mm(flip_y(*y)),
                fonts.get(style.font),
            );
        }
    }
}

fn flip_y(y: f32) -> f32 {
    PAGE_HEIGHT_MM - y
}

fn pdf_rect(rect: &Rect) -> printpdf::Rect {
    printpdf::Rect::new(
        Mm(rect.x),
        Mm(flip_y(rect.y + rect.height)),
        Mm(rect.x + rect.width),
        Mm(flip_y(rect.y)),
    )
}

fn pdf_color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn dash_pattern(dash: Dash) -> LineDashPattern {
    LineDashPattern {
        dash_1: Some((dash.on * MM_TO_PT).round() as i64),
        gap_1: Some((dash.off * MM_TO_PT).round() as i64),
        ..LineDashPattern::default()
    }
}

/// Approximate advance width. The standard fonts expose no metrics through
/// printpdf, so average glyph widths stand in.
pub fn text_width_mm(text: &str, style: &TextStyle) -> f32 {
    let em = match style.font {
        Font::Helvetica => 0.50,
        Font::HelveticaBold => 0.55,
        Font::CourierBold => 0.60,
    };
    text.chars().count() as f32 * style.size_pt * em * PT_TO_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_booking_core::{layout_ticket, BookingConfig, LayoutPolicy, TicketViewModel};

    fn view() -> TicketViewModel {
        TicketViewModel {
            id: "BK-24680".to_string(),
            full_name: "Dilani Fernando".to_string(),
            whatsapp: "0711111111".to_string(),
            dob: "1995-12-01".to_string(),
            tob: "06:45".to_string(),
            service: "Career Guidance".to_string(),
            ..TicketViewModel::default()
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let ops = layout_ticket(&view(), &BookingConfig::default(), &LayoutPolicy::default());
        let bytes = PdfTicketRenderer::new()
            .render(&ops, "Booking BK-24680")
            .expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn empty_layout_still_renders() {
        let bytes = PdfTicketRenderer::new().render(&[], "empty").expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn y_flips_to_bottom_left_origin() {
        assert_eq!(flip_y(0.0), PAGE_HEIGHT_MM);
        assert_eq!(flip_y(146.0 + 6.0), 8.0);
        assert_eq!(flip_y(PAGE_HEIGHT_MM), 0.0);
    }

    #[test]
    fn dash_lengths_convert_to_points() {
        let pattern = dash_pattern(Dash { on: 2.0, off: 2.0 });
        assert_eq!(pattern.dash_1, Some(6));
        assert_eq!(pattern.gap_1, Some(6));
        assert_eq!(pattern.dash_2, None);
    }

    #[test]
    fn centred_width_grows_with_text() {
        let style = TextStyle {
            font: Font::HelveticaBold,
            size_pt: 14.0,
            color: Rgb(0, 0, 0),
            align: Align::Center,
        };
        let short = text_width_mm("AB", &style);
        let long = text_width_mm("ABCD", &style);
        assert!((long - 2.0 * short).abs() < 1e-4);
        assert!(text_width_mm("SAMITHA SALGADO", &style) < PAGE_WIDTH_MM);
    }
}
