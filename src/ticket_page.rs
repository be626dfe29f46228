use std::rc::Rc;

use astro_booking_core::{
    run_ticket_page, BookingConfig, HandoffEnvelope, StoredImages, TicketHost, TicketViewModel,
};
use astro_booking_ticket::PdfTicketRenderer;
use yew::prelude::*;

use crate::adapters::{navigate_to, BrowserSessionStore};
use crate::config::current_query;
use crate::download::{save_bytes, PDF_MIME};

struct BrowserTicketHost {
    link: UseStateHandle<Option<String>>,
}

impl TicketHost for BrowserTicketHost {
    fn alert(&self, message: &str) {
        gloo::dialogs::alert(message);
    }

    fn navigate(&self, url: &str) {
        navigate_to(url);
    }

    fn save(&self, file_name: &str, bytes: &[u8]) {
        if let Err(err) = save_bytes(file_name, bytes, PDF_MIME) {
            gloo::console::error!("ticket download failed", err);
        }
    }

    fn set_messaging_link(&self, url: &str) {
        self.link.set(Some(url.to_string()));
    }
}

#[derive(Properties, PartialEq)]
pub(crate) struct TicketPageProps {
    pub(crate) config: Rc<BookingConfig>,
}

#[function_component(TicketPage)]
pub(crate) fn ticket_page(props: &TicketPageProps) -> Html {
    let link = use_state(|| None::<String>);
    let ticket = use_state(|| None::<TicketViewModel>);
    let images = use_state(StoredImages::default);

    {
        let config = props.config.clone();
        let link = link.clone();
        let ticket = ticket.clone();
        let images = images.clone();
        use_effect_with((), move |_| {
            let query = current_query();
            let host = BrowserTicketHost { link };
            match run_ticket_page(&host, &PdfTicketRenderer::new(), &query, &config) {
                Ok(prepared) => {
                    if let Ok(envelope) = HandoffEnvelope::from_query(&query) {
                        images.set(envelope.load_images(&BrowserSessionStore));
                    }
                    gloo::console::log!("ticket generated", prepared.file_name.clone());
                    ticket.set(Some(prepared.view));
                }
                Err(err) => gloo::console::warn!("ticket page", err.to_string()),
            }
            || ()
        });
    }

    let Some(view) = (*ticket).clone() else {
        return html! { <main class="ticket"><p>{ "Preparing your ticket..." }</p></main> };
    };

    let preview = |label: &'static str, data: &Option<String>| -> Html {
        match data {
            Some(src) => html! {
                <figure class="ticket-image">
                    <img src={src.clone()} alt={label} />
                    <figcaption>{ label }</figcaption>
                </figure>
            },
            None => html! {},
        }
    };

    html! {
        <main class="ticket">
            <h1>{ "Booking Received" }</h1>
            <p class="ticket-ref">{ "Reference: " }<strong>{ view.id.clone() }</strong></p>
            <p>{ format!("Thank you, {}. Your ticket has been downloaded.", view.full_name) }</p>
            <div class="ticket-images">
                { preview("Payment slip", &images.payment_slip) }
                { preview("Horoscope", &images.horoscope) }
            </div>
            if let Some(href) = (*link).clone() {
                <a id="whatsappBtn" class="whatsapp-btn" href={href} target="_blank" rel="noopener">
                    { "Send ticket on WhatsApp" }
                </a>
            }
        </main>
    }
}
