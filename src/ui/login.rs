use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;

use crate::app::{Session, SessionUser};

pub fn show_login_window(app: &Application) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Pro-Trans — Connexion")
        .default_width(440)
        .default_height(360)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    // Root container
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Se connecter à Pro-Trans"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let saved = Session::load();

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Serveur (ex. https://api.protrans.ma)"));
    server_entry.set_hexpand(true);
    if !saved.base_url.is_empty() {
        server_entry.set_text(&saved.base_url);
    }

    let email_entry = gtk::Entry::new();
    email_entry.set_placeholder_text(Some("Adresse e-mail"));
    email_entry.set_hexpand(true);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Mot de passe"));
    pass_entry.set_hexpand(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&email_entry);
    form.append(&pass_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let login_btn = gtk::Button::with_label("Connexion");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);

    let register_btn = gtk::Button::with_label("Créer un compte");
    let forgot_btn = gtk::Button::with_label("Mot de passe oublié ?");
    forgot_btn.add_css_class("flat");

    let actions = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    actions.append(&forgot_btn);
    actions.append(&register_btn);
    actions.append(&login_btn);
    actions.set_halign(gtk::Align::End);
    root.append(&actions);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Pro-Trans"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_login = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let email_entry = email_entry.clone();
        let pass_entry = pass_entry.clone();
        let status = status.clone();
        move || {
            let overlay = overlay.clone();
            let base_url = crate::utils::normalize_url(&server_entry.text());
            let email = email_entry.text().to_string();
            let password = pass_entry.text().to_string();
            if url::Url::parse(&base_url).is_err() {
                overlay.add_toast(adw::Toast::new("Adresse du serveur invalide."));
                return;
            }
            if email.is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new("Saisissez e-mail et mot de passe."));
                return;
            }

            status.set_label("Connexion…");

            let base_for_async = base_url.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.login(&base_for_async, &email, &password).await
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            let base_for_save = base_url.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(auth) => {
                        status_label.set_label("Connecté");
                        if !auth.user.email_verifie {
                            overlay2.add_toast(adw::Toast::new(
                                "Pensez à vérifier votre adresse e-mail.",
                            ));
                        }
                        let mut session = Session::load();
                        session.base_url = base_for_save.clone();
                        session.token = Some(auth.token.clone());
                        session.user = Some(SessionUser {
                            id: auth.user.id.clone(),
                            nom: auth.user.nom.clone(),
                            email: auth.user.email.clone(),
                            role: auth.user.role.clone(),
                        });
                        if let Err(e) = session.save() {
                            overlay2.add_toast(adw::Toast::new(&format!(
                                "Impossible d'enregistrer la session : {}",
                                e
                            )));
                        }
                        crate::ui::main_window::show_main_window(&app2, session);
                        window2.close();
                    }
                    Err(err) => {
                        log::warn!("login failed: {err}");
                        status_label.set_label("Échec de la connexion");
                        crate::ui::toast_api_error(&overlay2, &err);
                    }
                }
                glib::ControlFlow::Continue
            });
        }
    };

    use std::rc::Rc;
    let on_login: Rc<dyn Fn()> = Rc::new(on_login);
    {
        let on_login = on_login.clone();
        login_btn.connect_clicked(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        email_entry.connect_activate(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        pass_entry.connect_activate(move |_| (on_login)());
    }

    {
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        register_btn.connect_clicked(move |_| {
            show_register_dialog(&window, &overlay, &crate::utils::normalize_url(&server_entry.text()));
        });
    }
    {
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        forgot_btn.connect_clicked(move |_| {
            show_forgot_dialog(&window, &overlay, &crate::utils::normalize_url(&server_entry.text()));
        });
    }

    window.present();
}

fn show_register_dialog(parent: &adw::ApplicationWindow, overlay: &adw::ToastOverlay, base_url: &str) {
    let dialog = gtk::Dialog::builder()
        .title("Créer un compte")
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let nom_entry = gtk::Entry::new();
    nom_entry.set_placeholder_text(Some("Nom complet"));
    content.append(&nom_entry);

    let email_entry = gtk::Entry::new();
    email_entry.set_placeholder_text(Some("Adresse e-mail"));
    content.append(&email_entry);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Mot de passe"));
    content.append(&pass_entry);

    let role_row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let role_label = gtk::Label::new(Some("Je suis :"));
    let role_dropdown = gtk::DropDown::from_strings(&["Client", "Transporteur"]);
    role_row.append(&role_label);
    role_row.append(&role_dropdown);
    content.append(&role_row);

    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Annuler", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button("Créer", gtk::ResponseType::Ok);
    ok_btn.add_css_class("suggested-action");
    dialog.set_default_response(gtk::ResponseType::Ok);

    let overlay = overlay.clone();
    let base_url = base_url.to_string();
    let parent = parent.clone();
    dialog.connect_response(move |dlg, resp| {
        if resp != gtk::ResponseType::Ok {
            dlg.close();
            return;
        }
        let nom = nom_entry.text().to_string();
        let email = email_entry.text().to_string();
        let password = pass_entry.text().to_string();
        if let Err(e) = crate::forms::validation::require_text("nom", "Nom", &nom)
            .and_then(|_| crate::forms::validation::require_email("email", &email))
            .and_then(|_| {
                crate::forms::validation::require_min_len("motDePasse", "Mot de passe", &password, 8)
            })
        {
            overlay.add_toast(adw::Toast::new(&e.message));
            return;
        }
        let role = if role_dropdown.selected() == 1 { "transporteur" } else { "client" };

        let base = base_url.clone();
        let role = role.to_string();
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.register(&base, &nom, &email, &password, &role).await
        });
        let overlay2 = overlay.clone();
        let parent2 = parent.clone();
        let base2 = base_url.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(_) => {
                    overlay2.add_toast(adw::Toast::new(
                        "Compte créé. Un code de vérification vous a été envoyé par e-mail.",
                    ));
                    show_verify_dialog(&parent2, &overlay2, &base2);
                }
                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
            }
            glib::ControlFlow::Continue
        });
        dlg.close();
    });

    dialog.present();
}

fn show_verify_dialog(parent: &adw::ApplicationWindow, overlay: &adw::ToastOverlay, base_url: &str) {
    let dialog = gtk::Dialog::builder()
        .title("Vérifier l'adresse e-mail")
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let info = gtk::Label::new(Some("Collez le code reçu par e-mail :"));
    info.set_halign(gtk::Align::Start);
    content.append(&info);
    let code_entry = gtk::Entry::new();
    code_entry.set_placeholder_text(Some("Code de vérification"));
    content.append(&code_entry);

    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Plus tard", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button("Vérifier", gtk::ResponseType::Ok);
    ok_btn.add_css_class("suggested-action");

    let overlay = overlay.clone();
    let base_url = base_url.to_string();
    dialog.connect_response(move |dlg, resp| {
        if resp != gtk::ResponseType::Ok {
            dlg.close();
            return;
        }
        let code = code_entry.text().to_string();
        if code.trim().is_empty() {
            overlay.add_toast(adw::Toast::new("Saisissez le code de vérification."));
            return;
        }
        let base = base_url.clone();
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.verify_email(&base, &code).await
        });
        let overlay2 = overlay.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(()) => overlay2.add_toast(adw::Toast::new("Adresse e-mail vérifiée.")),
                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
            }
            glib::ControlFlow::Continue
        });
        dlg.close();
    });

    dialog.present();
}

fn show_forgot_dialog(parent: &adw::ApplicationWindow, overlay: &adw::ToastOverlay, base_url: &str) {
    let dialog = gtk::Dialog::builder()
        .title("Mot de passe oublié")
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let email_entry = gtk::Entry::new();
    email_entry.set_placeholder_text(Some("Adresse e-mail"));
    content.append(&email_entry);

    let send_btn = gtk::Button::with_label("Envoyer le lien");
    send_btn.set_halign(gtk::Align::End);
    content.append(&send_btn);

    let sep = gtk::Separator::new(gtk::Orientation::Horizontal);
    content.append(&sep);

    let info = gtk::Label::new(Some("Déjà reçu un code ? Réinitialisez ici :"));
    info.set_halign(gtk::Align::Start);
    info.add_css_class("dim-label");
    content.append(&info);

    let code_entry = gtk::Entry::new();
    code_entry.set_placeholder_text(Some("Code de réinitialisation"));
    content.append(&code_entry);

    let new_pass_entry = gtk::PasswordEntry::new();
    new_pass_entry.set_placeholder_text(Some("Nouveau mot de passe"));
    content.append(&new_pass_entry);

    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Fermer", gtk::ResponseType::Cancel);
    let reset_btn = dialog.add_button("Réinitialiser", gtk::ResponseType::Ok);
    reset_btn.add_css_class("suggested-action");

    {
        let overlay = overlay.clone();
        let base_url = base_url.to_string();
        let email_entry = email_entry.clone();
        send_btn.connect_clicked(move |_| {
            let email = email_entry.text().to_string();
            if let Err(e) = crate::forms::validation::require_email("email", &email) {
                overlay.add_toast(adw::Toast::new(&e.message));
                return;
            }
            let base = base_url.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.forgot_password(&base, &email).await
            });
            let overlay2 = overlay.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(()) => overlay2.add_toast(adw::Toast::new(
                        "Si un compte existe, un e-mail de réinitialisation a été envoyé.",
                    )),
                    Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                }
                glib::ControlFlow::Continue
            });
        });
    }

    let overlay = overlay.clone();
    let base_url = base_url.to_string();
    dialog.connect_response(move |dlg, resp| {
        if resp != gtk::ResponseType::Ok {
            dlg.close();
            return;
        }
        let code = code_entry.text().to_string();
        let password = new_pass_entry.text().to_string();
        if code.trim().is_empty() || password.is_empty() {
            overlay.add_toast(adw::Toast::new("Saisissez le code et le nouveau mot de passe."));
            return;
        }
        let base = base_url.clone();
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.reset_password(&base, &code, &password).await
        });
        let overlay2 = overlay.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(()) => {
                    overlay2.add_toast(adw::Toast::new("Mot de passe réinitialisé, reconnectez-vous."))
                }
                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
            }
            glib::ControlFlow::Continue
        });
        dlg.close();
    });

    dialog.present();
}
