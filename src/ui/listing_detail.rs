use adw::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::{Listing, Quote};
use crate::app::Session;
use crate::utils::TaskGuard;

/// Right-hand pane of the main window: one listing, its quotes, and the
/// quote form for transporters.
pub struct DetailView {
    root: gtk::Box,
    content: gtk::Box,
    overlay: adw::ToastOverlay,
    session: Session,
    guard: RefCell<Option<TaskGuard>>,
}

impl DetailView {
    pub fn new(overlay: &adw::ToastOverlay, session: Session) -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder().vexpand(true).hexpand(true).build();
        let content = gtk::Box::new(gtk::Orientation::Vertical, 8);
        let placeholder = gtk::Label::new(Some("Sélectionnez une annonce pour afficher le détail."));
        placeholder.add_css_class("dim-label");
        content.append(&placeholder);
        scroller.set_child(Some(&content));
        root.append(&scroller);

        Rc::new(Self {
            root,
            content,
            overlay: overlay.clone(),
            session: session.clone(),
            guard: RefCell::new(None),
        })
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn load(this: &Rc<Self>, listing_id: &str) {
        let Some((base_url, token)) = this.session.auth() else { return };
        let id = listing_id.to_string();
        let (rx, guard) = crate::utils::run_cancellable_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            let listing = client.listing(&base_url, &token, &id).await?;
            // Quotes are owner-only on the backend; a refusal just means
            // we render the listing without them.
            let quotes = client.listing_quotes(&base_url, &token, &id).await.ok();
            Ok::<_, crate::api::error::ApiError>((listing, quotes))
        });
        *this.guard.borrow_mut() = Some(guard);
        let this = this.clone();
        rx.attach(None, move |res| {
            match res {
                Ok((listing, quotes)) => Self::render(&this, &listing, quotes),
                Err(err) => crate::ui::toast_api_error(&this.overlay, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    fn clear(&self) {
        while let Some(child) = self.content.first_child() {
            self.content.remove(&child);
        }
    }

    fn line(&self, text: &str, dim: bool) {
        let label = gtk::Label::new(Some(text));
        label.set_halign(gtk::Align::Start);
        label.set_wrap(true);
        if dim {
            label.add_css_class("dim-label");
        }
        self.content.append(&label);
    }

    fn render(this: &Rc<Self>, listing: &Listing, quotes: Option<Vec<Quote>>) {
        this.clear();

        let titre = gtk::Label::new(Some(&listing.titre));
        titre.add_css_class("title-2");
        titre.set_halign(gtk::Align::Start);
        titre.set_wrap(true);
        this.content.append(&titre);

        if listing.urgent {
            let badge = gtk::Label::new(Some("URGENT"));
            badge.add_css_class("error");
            badge.set_halign(gtk::Align::Start);
            this.content.append(&badge);
        }

        let type_label = crate::constants::TransportType::from_code(&listing.type_transport)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| listing.type_transport.clone());
        this.line(&format!("Type : {}", type_label), true);

        let mut route = format!(
            "{} → {} · départ {}",
            listing.ville_depart,
            listing.ville_arrivee,
            crate::utils::format_date(&listing.date_debut)
        );
        if let Some(fin) = &listing.date_fin {
            route.push_str(&format!(" · arrivée {}", crate::utils::format_date(fin)));
        }
        this.line(&route, false);

        this.line(&listing.description, false);

        if let Some(poids) = listing.poids {
            this.line(&format!("Poids : {} kg", poids), true);
        }
        if let Some(dims) = &listing.dimensions {
            this.line(
                &format!("Dimensions : {} × {} × {} cm", dims.longueur, dims.largeur, dims.hauteur),
                true,
            );
        }
        if let Some(volume) = listing.volume {
            this.line(&format!("Volume : {} m³", volume), true);
        }
        if let Some(budget) = listing.budget {
            this.line(&format!("Budget : {} MAD", budget), true);
        }

        let opts: Vec<&str> = crate::constants::ListingOption::ALL
            .iter()
            .filter(|o| match o {
                crate::constants::ListingOption::Chargement => listing.options.chargement,
                crate::constants::ListingOption::Dechargement => listing.options.dechargement,
                crate::constants::ListingOption::Montage => listing.options.montage,
                crate::constants::ListingOption::Emballage => listing.options.emballage,
            })
            .map(|o| o.label())
            .collect();
        if !opts.is_empty() {
            this.line(&format!("Options : {}", opts.join(", ")), true);
        }
        if !listing.photos.is_empty() {
            this.line(&format!("{} photo(s) jointe(s)", listing.photos.len()), true);
        }

        let user = this.session.user.clone();
        let is_owner = match (&user, &listing.client) {
            (Some(u), Some(c)) => u.id == c.id,
            _ => false,
        };
        let is_transporteur = user.as_ref().map(|u| u.role == "transporteur").unwrap_or(false);

        if is_owner {
            Self::render_owner_actions(this, listing);
        }
        if let Some(quotes) = quotes {
            if is_owner {
                Self::render_quotes_for_owner(this, listing, &quotes);
            }
        }
        if is_transporteur && !is_owner {
            Self::render_quote_form(this, listing);
        }
    }

    fn render_owner_actions(this: &Rc<Self>, listing: &Listing) {
        let actions = gtk::Box::new(gtk::Orientation::Horizontal, 8);

        if listing.statut.as_deref() != Some("terminee") {
            let close_btn = gtk::Button::with_label("Clôturer l'annonce");
            actions.append(&close_btn);
            let this2 = this.clone();
            let listing_id = listing.id.clone();
            close_btn.connect_clicked(move |_| {
                let Some((base_url, token)) = this2.session.auth() else { return };
                let id = listing_id.clone();
                let rx = crate::utils::run_async_to_main(async move {
                    let client = crate::api::client::ApiClient::new();
                    let payload = serde_json::json!({ "statut": "terminee" });
                    client.update_listing(&base_url, &token, &id, &payload).await
                });
                let this3 = this2.clone();
                let listing_id2 = listing_id.clone();
                rx.attach(None, move |res| {
                    match res {
                        Ok(_) => {
                            this3.overlay.add_toast(adw::Toast::new("Annonce clôturée."));
                            Self::load(&this3, &listing_id2);
                        }
                        Err(err) => crate::ui::toast_api_error(&this3.overlay, &err),
                    }
                    glib::ControlFlow::Continue
                });
            });
        }

        let delete_btn = gtk::Button::with_label("Supprimer");
        delete_btn.add_css_class("destructive-action");
        actions.append(&delete_btn);
        let this2 = this.clone();
        let listing_id = listing.id.clone();
        delete_btn.connect_clicked(move |_| {
            let Some((base_url, token)) = this2.session.auth() else { return };
            let id = listing_id.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.delete_listing(&base_url, &token, &id).await
            });
            let this3 = this2.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(()) => {
                        this3.overlay.add_toast(adw::Toast::new("Annonce supprimée."));
                        this3.clear();
                    }
                    Err(err) => crate::ui::toast_api_error(&this3.overlay, &err),
                }
                glib::ControlFlow::Continue
            });
        });

        this.content.append(&actions);
    }

    fn render_quotes_for_owner(this: &Rc<Self>, listing: &Listing, quotes: &[Quote]) {
        let sep = gtk::Separator::new(gtk::Orientation::Horizontal);
        this.content.append(&sep);
        let title = gtk::Label::new(Some(&format!("Devis reçus ({})", quotes.len())));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        this.content.append(&title);

        for quote in quotes {
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            let cell = gtk::Box::new(gtk::Orientation::Vertical, 2);
            cell.set_hexpand(true);

            let transporteur = quote
                .transporteur
                .as_ref()
                .map(|t| t.nom.clone())
                .unwrap_or_else(|| "Transporteur".to_string());
            let head = gtk::Label::new(Some(&format!("{} — {} MAD", transporteur, quote.montant)));
            head.set_halign(gtk::Align::Start);
            cell.append(&head);

            if let Some(msg) = &quote.message {
                let body = gtk::Label::new(Some(msg));
                body.add_css_class("dim-label");
                body.set_halign(gtk::Align::Start);
                body.set_wrap(true);
                cell.append(&body);
            }
            if let Some(date) = &quote.date_proposee {
                let when = gtk::Label::new(Some(&format!(
                    "Date proposée : {}",
                    crate::utils::format_date(date)
                )));
                when.add_css_class("dim-label");
                when.set_halign(gtk::Align::Start);
                cell.append(&when);
            }
            row.append(&cell);

            match quote.statut.as_deref() {
                Some("acceptee") => {
                    let state = gtk::Label::new(Some("Accepté"));
                    state.add_css_class("success");
                    row.append(&state);
                    if let Some(transporteur) = &quote.transporteur {
                        let review_btn = gtk::Button::with_label("Laisser un avis");
                        row.append(&review_btn);
                        let this2 = this.clone();
                        let transporteur_id = transporteur.id.clone();
                        review_btn.connect_clicked(move |_| {
                            Self::show_review_dialog(&this2, &transporteur_id);
                        });
                    }
                }
                Some("refusee") => {
                    let state = gtk::Label::new(Some("Refusé"));
                    state.add_css_class("error");
                    row.append(&state);
                }
                _ => {
                    let accept_btn = gtk::Button::with_label("Accepter");
                    accept_btn.add_css_class("suggested-action");
                    let refuse_btn = gtk::Button::with_label("Refuser");
                    row.append(&accept_btn);
                    row.append(&refuse_btn);

                    let this2 = this.clone();
                    let quote_id = quote.id.clone();
                    let listing_id = listing.id.clone();
                    accept_btn.connect_clicked(move |_| {
                        Self::decide_quote(&this2, &quote_id, &listing_id, true);
                    });
                    let this2 = this.clone();
                    let quote_id = quote.id.clone();
                    let listing_id = listing.id.clone();
                    refuse_btn.connect_clicked(move |_| {
                        Self::decide_quote(&this2, &quote_id, &listing_id, false);
                    });
                }
            }
            this.content.append(&row);
        }
    }

    fn decide_quote(this: &Rc<Self>, quote_id: &str, listing_id: &str, accept: bool) {
        let Some((base_url, token)) = this.session.auth() else { return };
        let quote_id = quote_id.to_string();
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            if accept {
                client.accept_quote(&base_url, &token, &quote_id).await
            } else {
                client.refuse_quote(&base_url, &token, &quote_id).await
            }
        });
        let this = this.clone();
        let listing_id = listing_id.to_string();
        rx.attach(None, move |res| {
            match res {
                Ok(_) => {
                    this.overlay.add_toast(adw::Toast::new(if accept {
                        "Devis accepté."
                    } else {
                        "Devis refusé."
                    }));
                    Self::load(&this, &listing_id);
                }
                Err(err) => crate::ui::toast_api_error(&this.overlay, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    fn show_review_dialog(this: &Rc<Self>, transporteur_id: &str) {
        let dialog = gtk::Dialog::builder().title("Laisser un avis").modal(true).build();
        if let Some(window) = this.root.root().and_then(|r| r.downcast::<gtk::Window>().ok()) {
            dialog.set_transient_for(Some(&window));
        }
        let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
        content.set_margin_top(12);
        content.set_margin_bottom(12);
        content.set_margin_start(12);
        content.set_margin_end(12);

        let picker = crate::ui::reviews_panel::StarPicker::new();
        content.append(&picker.widget());

        let comment_entry = gtk::Entry::new();
        comment_entry.set_placeholder_text(Some("Votre commentaire (10 caractères minimum)"));
        content.append(&comment_entry);

        dialog.set_child(Some(&content));
        let _ = dialog.add_button("Annuler", gtk::ResponseType::Cancel);
        let ok_btn = dialog.add_button("Publier", gtk::ResponseType::Ok);
        ok_btn.add_css_class("suggested-action");

        let this = this.clone();
        let transporteur_id = transporteur_id.to_string();
        dialog.connect_response(move |dlg, resp| {
            if resp != gtk::ResponseType::Ok {
                dlg.close();
                return;
            }
            let note = picker.value();
            let commentaire = comment_entry.text().to_string();
            if let Err(e) = crate::reviews::validate_review(note, &commentaire) {
                this.overlay.add_toast(adw::Toast::new(&e.message));
                return;
            }
            let Some((base_url, token)) = this.session.auth() else { return };
            let transporteur_id2 = transporteur_id.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client
                    .create_review(&base_url, &token, &transporteur_id2, note, &commentaire)
                    .await
            });
            let overlay = this.overlay.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(_) => overlay.add_toast(adw::Toast::new("Avis publié.")),
                    Err(err) => crate::ui::toast_api_error(&overlay, &err),
                }
                glib::ControlFlow::Continue
            });
            dlg.close();
        });

        dialog.present();
    }

    fn render_quote_form(this: &Rc<Self>, listing: &Listing) {
        let sep = gtk::Separator::new(gtk::Orientation::Horizontal);
        this.content.append(&sep);
        let title = gtk::Label::new(Some("Proposer un devis"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        this.content.append(&title);

        let montant_entry = gtk::Entry::new();
        montant_entry.set_placeholder_text(Some("Montant (MAD)"));
        this.content.append(&montant_entry);

        let date_entry = gtk::Entry::new();
        date_entry.set_placeholder_text(Some("Date proposée (AAAA-MM-JJ, optionnel)"));
        this.content.append(&date_entry);

        let message_entry = gtk::Entry::new();
        message_entry.set_placeholder_text(Some("Message (optionnel)"));
        this.content.append(&message_entry);

        let send_btn = gtk::Button::with_label("Envoyer le devis");
        send_btn.add_css_class("suggested-action");
        send_btn.set_halign(gtk::Align::End);
        this.content.append(&send_btn);

        let this = this.clone();
        let listing_id = listing.id.clone();
        send_btn.connect_clicked(move |_| {
            let montant = match crate::forms::validation::require_positive(
                "montant",
                "Montant",
                &montant_entry.text(),
            ) {
                Ok(m) => m,
                Err(e) => {
                    this.overlay.add_toast(adw::Toast::new(&e.message));
                    return;
                }
            };
            let date = date_entry.text().trim().to_string();
            if !date.is_empty() {
                if let Err(e) =
                    crate::forms::validation::parse_date("dateProposee", "Date proposée", &date)
                {
                    this.overlay.add_toast(adw::Toast::new(&e.message));
                    return;
                }
            }
            let message = message_entry.text().trim().to_string();

            let Some((base_url, token)) = this.session.auth() else { return };
            let listing_id2 = listing_id.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                let message = (!message.is_empty()).then_some(message);
                let date = (!date.is_empty()).then_some(date);
                client
                    .create_quote(
                        &base_url,
                        &token,
                        &listing_id2,
                        montant,
                        message.as_deref(),
                        date.as_deref(),
                    )
                    .await
            });
            let this2 = this.clone();
            let listing_id3 = listing_id.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(_) => {
                        this2.overlay.add_toast(adw::Toast::new("Devis envoyé."));
                        Self::load(&this2, &listing_id3);
                    }
                    Err(err) => crate::ui::toast_api_error(&this2.overlay, &err),
                }
                glib::ControlFlow::Continue
            });
        });
    }
}
