use std::rc::Rc;

use astro_booking_core::submission::{BUSY_LABEL, IDLE_LABEL};
use astro_booking_core::{
    Attachments, BookingConfig, FormFields, FormView, SubmissionController, SubmissionPhase,
};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    File, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition,
};
use yew::prelude::*;

use crate::adapters::{BrowserSessionStore, GlooDelivery, GlooTimer, LocationNavigator, WebNormalizer};
use crate::config::normalizer_config;

pub(crate) const SERVICES: [&str; 5] = [
    "Horoscope Reading",
    "Marriage Compatibility",
    "Career Guidance",
    "Auspicious Times",
    "General Consultation",
];

/// Binds the controller's view of the form to component state.
#[derive(Clone)]
struct FormBindings {
    fields: FormFields,
    busy: UseStateHandle<bool>,
    error: UseStateHandle<Option<String>>,
    phase: UseStateHandle<SubmissionPhase>,
}

impl FormView for FormBindings {
    fn fields(&self) -> FormFields {
        self.fields.clone()
    }

    fn set_busy(&self, busy: bool) {
        self.busy.set(busy);
    }

    fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));
    }

    fn hide_error(&self) {
        self.error.set(None);
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        gloo::console::debug!("submission phase", phase.label());
        self.phase.set(phase);
    }
}

fn text_input(handle: &UseStateHandle<String>) -> Callback<InputEvent> {
    let handle = handle.clone();
    Callback::from(move |event: InputEvent| {
        let input: HtmlInputElement = event.target_unchecked_into();
        handle.set(input.value());
    })
}

/// Choosing a file for an input that carries `error` also hides the error.
fn file_input(
    handle: &UseStateHandle<Option<File>>,
    error: Option<&UseStateHandle<Option<String>>>,
) -> Callback<Event> {
    let handle = handle.clone();
    let error = error.cloned();
    Callback::from(move |event: Event| {
        let input: HtmlInputElement = event.target_unchecked_into();
        let file = input.files().and_then(|files| files.get(0));
        if let (Some(_), Some(error)) = (&file, &error) {
            error.set(None);
        }
        handle.set(file);
    })
}

fn file_label(file: Option<&File>, empty: &'static str) -> Html {
    match file {
        Some(file) => html! { <span class="upload-file">{ file.name() }</span> },
        None => html! { <span class="upload-text">{ empty }</span> },
    }
}

fn scroll_into_view(node: &NodeRef) {
    let Some(element) = node.cast::<web_sys::Element>() else {
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Center);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

#[derive(Properties, PartialEq)]
pub(crate) struct BookingFormProps {
    pub(crate) config: Rc<BookingConfig>,
}

#[function_component(BookingForm)]
pub(crate) fn booking_form(props: &BookingFormProps) -> Html {
    let full_name = use_state(String::new);
    let whatsapp = use_state(String::new);
    let dob = use_state(String::new);
    let tob = use_state(String::new);
    let pob = use_state(String::new);
    let service = use_state(|| SERVICES[0].to_string());
    let question = use_state(String::new);
    let payment_slip = use_state(|| None::<File>);
    let horoscope = use_state(|| None::<File>);
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);
    let phase = use_state(SubmissionPhase::default);
    let error_ref = use_node_ref();

    {
        let error_ref = error_ref.clone();
        use_effect_with((*error).clone(), move |error| {
            if error.is_some() {
                scroll_into_view(&error_ref);
            }
            || ()
        });
    }

    let on_service_change = {
        let service = service.clone();
        Callback::from(move |event: Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            service.set(select.value());
        })
    };
    let on_question_input = {
        let question = question.clone();
        Callback::from(move |event: InputEvent| {
            let area: HtmlTextAreaElement = event.target_unchecked_into();
            question.set(area.value());
        })
    };

    let on_submit = {
        let config = props.config.clone();
        let bindings = FormBindings {
            fields: FormFields {
                full_name: (*full_name).clone(),
                whatsapp: (*whatsapp).clone(),
                dob: (*dob).clone(),
                tob: (*tob).clone(),
                pob: (*pob).clone(),
                service: (*service).clone(),
                question: (*question).clone(),
            },
            busy: busy.clone(),
            error: error.clone(),
            phase: phase.clone(),
        };
        let attachments = Attachments {
            payment_slip: (*payment_slip).clone(),
            horoscope: (*horoscope).clone(),
        };
        let in_flight = *busy;
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if in_flight {
                return;
            }
            let config = (*config).clone();
            let bindings = bindings.clone();
            let attachments = attachments.clone();
            spawn_local(async move {
                let controller = SubmissionController::new(
                    WebNormalizer::new(normalizer_config(&config)),
                    GlooDelivery::new(config.endpoint.clone()),
                    BrowserSessionStore,
                    LocationNavigator,
                    GlooTimer,
                )
                .with_config(config);
                match controller.submit(&bindings, &attachments).await {
                    Ok(report) => gloo::console::log!(
                        "booking complete",
                        report.booking_id.to_string(),
                        report.outcome.to_string()
                    ),
                    Err(err) => gloo::console::error!("submission error", err.to_string()),
                }
            });
        })
    };

    let error_view = match (*error).as_ref() {
        Some(message) => html! {
            <div class="error-message" role="alert" ref={error_ref.clone()}>{ message.clone() }</div>
        },
        None => html! { <div class="error-message hidden" ref={error_ref.clone()}></div> },
    };

    let label = if *busy { BUSY_LABEL } else { IDLE_LABEL };

    html! {
        <main class="booking">
            <form class="booking-form" onsubmit={on_submit}>
                <div class="field">
                    <label for="fullName">{ "Full Name" }</label>
                    <input id="fullName" type="text" required=true
                        value={(*full_name).clone()} oninput={text_input(&full_name)} />
                </div>
                <div class="field">
                    <label for="whatsapp">{ "WhatsApp Number" }</label>
                    <input id="whatsapp" type="tel" required=true
                        value={(*whatsapp).clone()} oninput={text_input(&whatsapp)} />
                </div>
                <div class="field-row">
                    <div class="field">
                        <label for="dob">{ "Date of Birth" }</label>
                        <input id="dob" type="date" required=true
                            value={(*dob).clone()} oninput={text_input(&dob)} />
                    </div>
                    <div class="field">
                        <label for="tob">{ "Time of Birth" }</label>
                        <input id="tob" type="time" required=true
                            value={(*tob).clone()} oninput={text_input(&tob)} />
                    </div>
                </div>
                <div class="field">
                    <label for="pob">{ "Place of Birth" }</label>
                    <input id="pob" type="text" required=true
                        value={(*pob).clone()} oninput={text_input(&pob)} />
                </div>
                <div class="field">
                    <label for="serviceType">{ "Service" }</label>
                    <select id="serviceType" onchange={on_service_change}>
                        { for SERVICES.iter().map(|name| html! {
                            <option value={*name} selected={*service == *name}>{ *name }</option>
                        }) }
                    </select>
                </div>
                <div class="field">
                    <label for="clientQuestion">{ "Your Question" }</label>
                    <textarea id="clientQuestion" rows="4"
                        value={(*question).clone()} oninput={on_question_input} />
                </div>
                <div class="file-upload-box">
                    <label for="paymentSlip">
                        { "Payment Slip" }
                        { file_label((*payment_slip).as_ref(), "Click to upload your payment slip") }
                    </label>
                    <input id="paymentSlip" type="file" accept="image/*"
                        onchange={file_input(&payment_slip, Some(&error))} />
                </div>
                <div class="file-upload-box">
                    <label for="horoscopeImage">
                        { "Horoscope Chart (optional)" }
                        { file_label((*horoscope).as_ref(), "Click to upload your horoscope") }
                    </label>
                    <input id="horoscopeImage" type="file" accept="image/*"
                        onchange={file_input(&horoscope, None)} />
                </div>
                { error_view }
                <button id="submitBtn" type="submit" disabled={*busy}>{ label }</button>
                if *busy {
                    <p class="phase">{ phase.label() }</p>
                }
            </form>
        </main>
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use astro_booking_core::submission::MISSING_SLIP_MESSAGE;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::{DataTransfer, Element, EventInit};

    wasm_bindgen_test_configure!(run_in_browser);

    async fn mount_form() -> Element {
        let document = gloo::utils::document();
        let root = document.create_element("div").expect("root");
        gloo::utils::body().append_child(&root).expect("append");
        yew::Renderer::<BookingForm>::with_root_and_props(
            root.clone(),
            BookingFormProps {
                config: Rc::new(BookingConfig::default()),
            },
        )
        .render();
        TimeoutFuture::new(20).await;
        root
    }

    fn dispatch(target: &Element, kind: &str) {
        let init = EventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        let event = Event::new_with_event_init_dict(kind, &init).expect("event");
        target.dispatch_event(&event).expect("dispatch");
    }

    fn select(root: &Element, selector: &str) -> Element {
        root.query_selector(selector).expect("query").expect(selector)
    }

    #[wasm_bindgen_test]
    async fn submit_without_slip_shows_error_and_stays_idle() {
        let root = mount_form().await;
        dispatch(&select(&root, "form"), "submit");
        TimeoutFuture::new(20).await;

        let error = select(&root, ".error-message");
        assert_eq!(error.text_content().as_deref(), Some(MISSING_SLIP_MESSAGE));
        assert!(!error.class_name().contains("hidden"));
        let button = select(&root, "#submitBtn");
        assert!(!button.has_attribute("disabled"));
        assert_eq!(button.text_content().as_deref(), Some(IDLE_LABEL));
    }

    #[wasm_bindgen_test]
    async fn choosing_a_payment_slip_hides_the_error() {
        let root = mount_form().await;
        dispatch(&select(&root, "form"), "submit");
        TimeoutFuture::new(20).await;
        assert!(!select(&root, ".error-message").class_name().contains("hidden"));

        let bytes = js_sys::Uint8Array::from(&b"\x89PNG"[..]);
        let parts = js_sys::Array::of1(&bytes);
        let file = File::new_with_u8_array_sequence(&parts, "slip.png").expect("file");
        let transfer = DataTransfer::new().expect("transfer");
        transfer.items().add_with_file(&file).expect("add file");
        let input: HtmlInputElement = select(&root, "#paymentSlip").unchecked_into();
        input.set_files(transfer.files().as_ref());
        dispatch(&input, "change");
        TimeoutFuture::new(20).await;

        assert!(select(&root, ".error-message").class_name().contains("hidden"));
        assert_eq!(
            select(&root, "label[for=paymentSlip] .upload-file").text_content().as_deref(),
            Some("slip.png")
        );
    }
}
