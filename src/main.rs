use std::rc::Rc;

use yew::prelude::*;

mod adapters;
mod config;
mod download;
mod form_page;
mod ticket_page;

use form_page::BookingForm;
use ticket_page::TicketPage;

#[function_component(App)]
fn app() -> Html {
    let settings: Rc<_> = use_memo((), |_| config::booking_config());
    if config::is_ticket_path(&config::current_path(), &settings.ticket_path) {
        html! { <TicketPage config={settings} /> }
    } else {
        html! { <BookingForm config={settings} /> }
    }
}

fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn ticket_path_matches_only_the_ticket_page() {
        assert!(config::is_ticket_path("/ticket.html", "ticket.html"));
        assert!(config::is_ticket_path("/site/ticket", "ticket.html"));
        assert!(!config::is_ticket_path("/", "ticket.html"));
        assert!(!config::is_ticket_path("/index.html", "ticket.html"));
        assert!(!config::is_ticket_path("/tickets.html", "ticket.html"));
    }

    #[wasm_bindgen_test]
    fn session_store_round_trips_raw_strings() {
        use astro_booking_core::SessionStore;

        let store = adapters::BrowserSessionStore;
        store
            .set_item("astroBookingTest", "data:image/jpeg;base64,AAAA")
            .expect("set");
        assert_eq!(
            store.get_item("astroBookingTest").as_deref(),
            Some("data:image/jpeg;base64,AAAA")
        );
        assert_eq!(store.get_item("astroBookingMissing"), None);
    }

    #[wasm_bindgen_test]
    fn object_url_is_created_for_pdf_bytes() {
        let url = download::create_object_url(b"%PDF-1.3", download::PDF_MIME).expect("url");
        assert!(url.starts_with("blob:"));
        let _ = web_sys::Url::revoke_object_url(&url);
    }
}
