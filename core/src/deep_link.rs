use url::form_urlencoded;

use crate::handoff::TicketViewModel;

pub const MESSAGING_BASE_URL: &str = "https://wa.me";

pub fn booking_message(greeting: &str, view: &TicketViewModel) -> String {
    format!(
        "Hello {greeting}, here is my booking.\n\n*Ref:* {}\n*Name:* {}\nI have attached the *PDF Ticket* below. \u{1F447}",
        view.id, view.full_name
    )
}

/// Percent-encodes a message body. Spaces become `%20`, not `+`.
pub fn encode_message(message: &str) -> String {
    form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Pre-filled chat link to `recipient`. The ticket PDF cannot ride along;
/// the user attaches it by hand.
pub fn messaging_link(recipient: &str, greeting: &str, view: &TicketViewModel) -> String {
    let recipient: String = recipient.chars().filter(char::is_ascii_digit).collect();
    let text = encode_message(&booking_message(greeting, view));
    format!("{MESSAGING_BASE_URL}/{recipient}?text={text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> TicketViewModel {
        TicketViewModel {
            id: "BK-48213".to_string(),
            full_name: "Anu & Co".to_string(),
            ..TicketViewModel::default()
        }
    }

    #[test]
    fn link_interpolates_reference_and_name() {
        let link = messaging_link("+94 75 258 2482", "Samitha", &view());
        assert!(link.starts_with("https://wa.me/94752582482?text=Hello%20Samitha%2C"));
        assert!(link.contains("*Ref:*%20BK-48213%0A"));
        assert!(link.contains("*Name:*%20Anu%20%26%20Co%0A"));
        assert!(!link.contains(' '));
        assert!(!link.contains('+'));
    }

    #[test]
    fn literal_plus_survives_encoding() {
        assert_eq!(encode_message("a+b c"), "a%2Bb%20c");
    }
}
