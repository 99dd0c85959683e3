use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::Session;
use crate::forms::photos::PhotoAttachment;
use crate::utils::TaskGuard;

pub fn show_profile_window(app: &Application, session: Session) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Profil")
        .default_width(540)
        .default_height(720)
        .build();

    let overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 10);
    root.set_margin_top(16);
    root.set_margin_bottom(16);
    root.set_margin_start(16);
    root.set_margin_end(16);

    let identity = gtk::Label::new(None);
    identity.add_css_class("title-3");
    identity.set_halign(gtk::Align::Start);
    root.append(&identity);

    let email_label = gtk::Label::new(None);
    email_label.add_css_class("dim-label");
    email_label.set_halign(gtk::Align::Start);
    root.append(&email_label);

    let nom_entry = gtk::Entry::new();
    nom_entry.set_placeholder_text(Some("Nom"));
    root.append(&nom_entry);

    let prenom_entry = gtk::Entry::new();
    prenom_entry.set_placeholder_text(Some("Prénom"));
    root.append(&prenom_entry);

    let telephone_entry = gtk::Entry::new();
    telephone_entry.set_placeholder_text(Some("Téléphone"));
    root.append(&telephone_entry);

    let ville_entry = gtk::Entry::new();
    ville_entry.set_placeholder_text(Some("Ville"));
    root.append(&ville_entry);

    let bio_entry = gtk::Entry::new();
    bio_entry.set_placeholder_text(Some("Présentation"));
    root.append(&bio_entry);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let photo_btn = gtk::Button::with_label("Changer la photo");
    let document_btn = gtk::Button::with_label("Envoyer un document");
    let save_btn = gtk::Button::with_label("Enregistrer");
    save_btn.add_css_class("suggested-action");
    buttons.append(&photo_btn);
    buttons.append(&document_btn);
    let spacer = gtk::Box::new(gtk::Orientation::Horizontal, 0);
    spacer.set_hexpand(true);
    buttons.append(&spacer);
    buttons.append(&save_btn);
    root.append(&buttons);

    let sep = gtk::Separator::new(gtk::Orientation::Horizontal);
    root.append(&sep);

    // Reviews received by the signed-in user; no form on one's own profile.
    let my_id = session.user.as_ref().map(|u| u.id.clone()).unwrap_or_default();
    let reviews = crate::ui::reviews_panel::ReviewsPanel::new(&overlay, session.clone(), &my_id, false);
    root.append(&reviews.widget());
    crate::ui::reviews_panel::ReviewsPanel::load(&reviews);

    overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("Profil"));
    header.set_title_widget(Some(&title));
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let fetch_guard: Rc<RefCell<Option<TaskGuard>>> = Rc::new(RefCell::new(None));
    {
        let fetch_guard = fetch_guard.clone();
        window.connect_close_request(move |_| {
            fetch_guard.borrow_mut().take();
            glib::Propagation::Proceed
        });
    }

    // Load the authoritative profile.
    if let Some((base_url, token)) = session.auth() {
        let (rx, guard) = crate::utils::run_cancellable_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.profile(&base_url, &token).await
        });
        *fetch_guard.borrow_mut() = Some(guard);
        let overlay2 = overlay.clone();
        let identity2 = identity.clone();
        let email2 = email_label.clone();
        let nom2 = nom_entry.clone();
        let prenom2 = prenom_entry.clone();
        let telephone2 = telephone_entry.clone();
        let ville2 = ville_entry.clone();
        let bio2 = bio_entry.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(profile) => {
                    let role = if profile.role == "transporteur" { "Transporteur" } else { "Client" };
                    identity2.set_label(&format!("{} — {}", profile.nom, role));
                    let verified = if profile.email_verifie { "vérifié" } else { "non vérifié" };
                    email2.set_label(&format!("{} ({})", profile.email, verified));
                    nom2.set_text(&profile.nom);
                    prenom2.set_text(profile.prenom.as_deref().unwrap_or(""));
                    telephone2.set_text(profile.telephone.as_deref().unwrap_or(""));
                    ville2.set_text(profile.ville.as_deref().unwrap_or(""));
                    bio2.set_text(profile.bio.as_deref().unwrap_or(""));
                }
                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    {
        let overlay = overlay.clone();
        let session = session.clone();
        let nom_entry = nom_entry.clone();
        let prenom_entry = prenom_entry.clone();
        let telephone_entry = telephone_entry.clone();
        let ville_entry = ville_entry.clone();
        let bio_entry = bio_entry.clone();
        save_btn.connect_clicked(move |_| {
            let nom = nom_entry.text().to_string();
            if let Err(e) = crate::forms::validation::require_text("nom", "Nom", &nom) {
                overlay.add_toast(adw::Toast::new(&e.message));
                return;
            }
            let mut payload = serde_json::json!({ "nom": nom });
            for (key, value) in [
                ("prenom", prenom_entry.text().to_string()),
                ("telephone", telephone_entry.text().to_string()),
                ("ville", ville_entry.text().to_string()),
                ("bio", bio_entry.text().to_string()),
            ] {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    payload[key] = serde_json::Value::String(value);
                }
            }
            let Some((base_url, token)) = session.auth() else { return };
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.update_profile(&base_url, &token, &payload).await
            });
            let overlay2 = overlay.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(_) => overlay2.add_toast(adw::Toast::new("Profil mis à jour.")),
                    Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                }
                glib::ControlFlow::Continue
            });
        });
    }

    let chooser_slot: Rc<RefCell<Option<gtk::FileChooserNative>>> = Rc::new(RefCell::new(None));
    {
        let overlay = overlay.clone();
        let session = session.clone();
        let window = window.clone();
        let chooser_slot = chooser_slot.clone();
        photo_btn.connect_clicked(move |_| {
            let chooser = gtk::FileChooserNative::new(
                Some("Choisir une photo de profil"),
                Some(&window),
                gtk::FileChooserAction::Open,
                Some("Choisir"),
                Some("Annuler"),
            );
            let filter = gtk::FileFilter::new();
            filter.add_mime_type("image/*");
            filter.set_name(Some("Images"));
            chooser.add_filter(&filter);

            let overlay = overlay.clone();
            let session = session.clone();
            let chooser_slot2 = chooser_slot.clone();
            chooser.connect_response(move |dialog, resp| {
                if resp == gtk::ResponseType::Accept {
                    if let Some(path) = dialog.file().and_then(|f| f.path()) {
                        match PhotoAttachment::from_path(path) {
                            Ok(photo) if photo.is_image() => {
                                let Some((base_url, token)) = session.auth() else { return };
                                let rx = crate::utils::run_async_to_main(async move {
                                    let client = crate::api::client::ApiClient::new();
                                    client.upload_profile_photo(&base_url, &token, &photo).await
                                });
                                let overlay2 = overlay.clone();
                                rx.attach(None, move |res| {
                                    match res {
                                        Ok(_) => overlay2
                                            .add_toast(adw::Toast::new("Photo de profil mise à jour.")),
                                        Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                                    }
                                    glib::ControlFlow::Continue
                                });
                            }
                            Ok(_) => {
                                overlay.add_toast(adw::Toast::new("Choisissez un fichier image."))
                            }
                            Err(e) => overlay
                                .add_toast(adw::Toast::new(&format!("Fichier illisible : {}", e))),
                        }
                    }
                }
                chooser_slot2.borrow_mut().take();
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }

    {
        let overlay = overlay.clone();
        let session = session.clone();
        let window = window.clone();
        let chooser_slot = chooser_slot.clone();
        document_btn.connect_clicked(move |_| {
            let chooser = gtk::FileChooserNative::new(
                Some("Envoyer un document"),
                Some(&window),
                gtk::FileChooserAction::Open,
                Some("Envoyer"),
                Some("Annuler"),
            );
            let overlay = overlay.clone();
            let session = session.clone();
            let chooser_slot2 = chooser_slot.clone();
            chooser.connect_response(move |dialog, resp| {
                if resp == gtk::ResponseType::Accept {
                    if let Some(path) = dialog.file().and_then(|f| f.path()) {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "document".to_string());
                        let Some((base_url, token)) = session.auth() else { return };
                        let rx = crate::utils::run_async_to_main(async move {
                            let client = crate::api::client::ApiClient::new();
                            client.upload_document(&base_url, &token, &path, &name).await
                        });
                        let overlay2 = overlay.clone();
                        rx.attach(None, move |res| {
                            match res {
                                Ok(()) => overlay2.add_toast(adw::Toast::new("Document envoyé.")),
                                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                            }
                            glib::ControlFlow::Continue
                        });
                    }
                }
                chooser_slot2.borrow_mut().take();
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }
}
