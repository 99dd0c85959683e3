use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::ListingSummary;
use crate::app::Session;
use crate::constants::TransportType;
use crate::forms::photos::PhotoAttachment;
use crate::forms::wizard::{ListingWizard, SubmitFailure, WizardError, WizardStep, submit_listing};

/// The four-step listing wizard. Every transition goes through the
/// `ListingWizard` state machine; the window only renders its state.
pub fn show_wizard_window(
    app: &Application,
    session: Session,
    on_created: Rc<dyn Fn(ListingSummary)>,
) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Nouvelle annonce")
        .default_width(560)
        .default_height(660)
        .build();

    let overlay = adw::ToastOverlay::new();
    let wizard = Rc::new(RefCell::new(ListingWizard::new()));

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(16);
    root.set_margin_bottom(16);
    root.set_margin_start(16);
    root.set_margin_end(16);

    let step_label = gtk::Label::new(None);
    step_label.add_css_class("title-4");
    step_label.set_halign(gtk::Align::Start);
    root.append(&step_label);

    let stack = gtk::Stack::new();
    stack.set_vexpand(true);
    root.append(&stack);

    // ----- step 1: general -----
    let general = gtk::Box::new(gtk::Orientation::Vertical, 8);

    let titre_entry = gtk::Entry::new();
    titre_entry.set_placeholder_text(Some("Titre de l'annonce"));
    general.append(&titre_entry);
    {
        let wizard = wizard.clone();
        titre_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.titre = e.text().to_string();
        });
    }

    let type_strings: Vec<&str> = std::iter::once("— Type de transport —")
        .chain(TransportType::ALL.iter().map(|t| t.label()))
        .collect();
    let type_dropdown = gtk::DropDown::from_strings(&type_strings);
    general.append(&type_dropdown);

    let desc_label = gtk::Label::new(Some("Description :"));
    desc_label.set_halign(gtk::Align::Start);
    desc_label.add_css_class("dim-label");
    general.append(&desc_label);
    let desc_scroller = gtk::ScrolledWindow::builder().min_content_height(120).build();
    let desc_view = gtk::TextView::new();
    desc_view.set_wrap_mode(gtk::WrapMode::WordChar);
    desc_scroller.set_child(Some(&desc_view));
    general.append(&desc_scroller);
    {
        let wizard = wizard.clone();
        desc_view.buffer().connect_changed(move |buf| {
            let (start, end) = buf.bounds();
            wizard.borrow_mut().draft.description = buf.text(&start, &end, false).to_string();
        });
    }

    stack.add_named(&general, Some("general"));

    // ----- step 2: cities and dates -----
    let cities = gtk::Box::new(gtk::Orientation::Vertical, 8);

    let depart_entry = gtk::Entry::new();
    depart_entry.set_placeholder_text(Some("Ville de départ"));
    let depart_suggestions = gtk::ListBox::new();
    cities.append(&depart_entry);
    cities.append(&depart_suggestions);

    let arrivee_entry = gtk::Entry::new();
    arrivee_entry.set_placeholder_text(Some("Ville d'arrivée"));
    let arrivee_suggestions = gtk::ListBox::new();
    cities.append(&arrivee_entry);
    cities.append(&arrivee_suggestions);

    {
        let wizard = wizard.clone();
        depart_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.ville_depart = e.text().to_string();
        });
    }
    {
        let wizard = wizard.clone();
        arrivee_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.ville_arrivee = e.text().to_string();
        });
    }
    attach_city_suggestions(&depart_entry, &depart_suggestions);
    attach_city_suggestions(&arrivee_entry, &arrivee_suggestions);

    let date_debut_entry = gtk::Entry::new();
    date_debut_entry.set_placeholder_text(Some("Date de départ (AAAA-MM-JJ)"));
    cities.append(&date_debut_entry);
    {
        let wizard = wizard.clone();
        date_debut_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.date_debut = e.text().to_string();
        });
    }

    let date_fin_entry = gtk::Entry::new();
    date_fin_entry.set_placeholder_text(Some("Date d'arrivée (AAAA-MM-JJ, optionnel)"));
    cities.append(&date_fin_entry);
    {
        let wizard = wizard.clone();
        date_fin_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.date_fin = e.text().to_string();
        });
    }

    stack.add_named(&cities, Some("cities"));

    // ----- step 3: details and options -----
    let details = gtk::Box::new(gtk::Orientation::Vertical, 8);

    let poids_entry = gtk::Entry::new();
    poids_entry.set_placeholder_text(Some("Poids en kg (optionnel)"));
    details.append(&poids_entry);
    {
        let wizard = wizard.clone();
        poids_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.poids = e.text().to_string();
        });
    }

    // Only package-like transport types carry dimensions.
    let dims_box = gtk::Box::new(gtk::Orientation::Vertical, 8);
    let dims_label = gtk::Label::new(Some("Dimensions (cm) :"));
    dims_label.set_halign(gtk::Align::Start);
    dims_label.add_css_class("dim-label");
    dims_box.append(&dims_label);
    let dims_row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let longueur_entry = gtk::Entry::new();
    longueur_entry.set_placeholder_text(Some("Longueur"));
    let largeur_entry = gtk::Entry::new();
    largeur_entry.set_placeholder_text(Some("Largeur"));
    let hauteur_entry = gtk::Entry::new();
    hauteur_entry.set_placeholder_text(Some("Hauteur"));
    dims_row.append(&longueur_entry);
    dims_row.append(&largeur_entry);
    dims_row.append(&hauteur_entry);
    dims_box.append(&dims_row);
    dims_box.set_visible(false);
    details.append(&dims_box);
    {
        let wizard = wizard.clone();
        longueur_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.longueur = e.text().to_string();
        });
    }
    {
        let wizard = wizard.clone();
        largeur_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.largeur = e.text().to_string();
        });
    }
    {
        let wizard = wizard.clone();
        hauteur_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.hauteur = e.text().to_string();
        });
    }

    {
        let wizard = wizard.clone();
        let dims_box = dims_box.clone();
        type_dropdown.connect_selected_notify(move |dd| {
            let selected = dd.selected() as usize;
            let ttype = selected
                .checked_sub(1)
                .and_then(|i| TransportType::ALL.get(i).copied());
            wizard.borrow_mut().draft.type_transport = ttype;
            dims_box.set_visible(ttype.is_some_and(|t| t.requires_dimensions()));
        });
    }

    let budget_entry = gtk::Entry::new();
    budget_entry.set_placeholder_text(Some("Budget en MAD (optionnel)"));
    details.append(&budget_entry);
    {
        let wizard = wizard.clone();
        budget_entry.connect_changed(move |e| {
            wizard.borrow_mut().draft.budget = e.text().to_string();
        });
    }

    let options_label = gtk::Label::new(Some("Services demandés :"));
    options_label.set_halign(gtk::Align::Start);
    options_label.add_css_class("dim-label");
    details.append(&options_label);
    for opt in crate::constants::ListingOption::ALL {
        let check = gtk::CheckButton::with_label(opt.label());
        details.append(&check);
        let wizard = wizard.clone();
        check.connect_toggled(move |c| {
            let mut w = wizard.borrow_mut();
            match opt {
                crate::constants::ListingOption::Chargement => w.draft.chargement = c.is_active(),
                crate::constants::ListingOption::Dechargement => w.draft.dechargement = c.is_active(),
                crate::constants::ListingOption::Montage => w.draft.montage = c.is_active(),
                crate::constants::ListingOption::Emballage => w.draft.emballage = c.is_active(),
            }
        });
    }
    let urgent_check = gtk::CheckButton::with_label("Transport urgent");
    details.append(&urgent_check);
    {
        let wizard = wizard.clone();
        urgent_check.connect_toggled(move |c| {
            wizard.borrow_mut().draft.urgent = c.is_active();
        });
    }

    stack.add_named(&details, Some("details"));

    // ----- step 4: photos and recap -----
    let photos_page = gtk::Box::new(gtk::Orientation::Vertical, 8);

    let photos_header = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let photos_count = gtk::Label::new(Some("0/5 photos"));
    photos_count.add_css_class("dim-label");
    photos_count.set_hexpand(true);
    photos_count.set_halign(gtk::Align::Start);
    photos_header.append(&photos_count);
    let add_photos_btn = gtk::Button::with_label("Ajouter des photos");
    photos_header.append(&add_photos_btn);
    photos_page.append(&photos_header);

    let photos_box = gtk::Box::new(gtk::Orientation::Vertical, 4);
    photos_page.append(&photos_box);

    let recap_label = gtk::Label::new(None);
    recap_label.set_halign(gtk::Align::Start);
    recap_label.set_wrap(true);
    recap_label.add_css_class("dim-label");
    photos_page.append(&recap_label);

    stack.add_named(&photos_page, Some("photos"));

    let update_count = {
        let wizard = wizard.clone();
        let photos_count = photos_count.clone();
        move || {
            photos_count.set_label(&format!(
                "{}/{} photos",
                wizard.borrow().photos.len(),
                crate::constants::MAX_LISTING_PHOTOS
            ));
        }
    };
    let update_count: Rc<dyn Fn()> = Rc::new(update_count);

    let append_photo_row = {
        let wizard = wizard.clone();
        let photos_box = photos_box.clone();
        let update_count = update_count.clone();
        move |photo: &PhotoAttachment| {
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            let preview = gtk::Image::from_file(&photo.path);
            preview.set_pixel_size(48);
            row.append(&preview);
            let name = gtk::Label::new(Some(&photo.name));
            name.set_hexpand(true);
            name.set_halign(gtk::Align::Start);
            name.set_ellipsize(gtk::pango::EllipsizeMode::Middle);
            row.append(&name);
            let remove_btn = gtk::Button::with_label("Retirer");
            row.append(&remove_btn);
            photos_box.append(&row);

            let wizard = wizard.clone();
            let photos_box = photos_box.clone();
            let row2 = row.clone();
            let path = photo.path.clone();
            let update_count = update_count.clone();
            remove_btn.connect_clicked(move |_| {
                let mut w = wizard.borrow_mut();
                let pos = w.photos.iter().position(|p| p.path == path);
                if let Some(pos) = pos {
                    // The removed attachment drops here, its preview row
                    // right after.
                    w.photos.remove(pos);
                }
                drop(w);
                photos_box.remove(&row2);
                (update_count)();
            });
        }
    };
    let append_photo_row: Rc<dyn Fn(&PhotoAttachment)> = Rc::new(append_photo_row);

    // FileChooserNative must stay referenced while it is shown.
    let chooser_slot: Rc<RefCell<Option<gtk::FileChooserNative>>> = Rc::new(RefCell::new(None));
    {
        let wizard = wizard.clone();
        let window = window.clone();
        let overlay = overlay.clone();
        let append_photo_row = append_photo_row.clone();
        let update_count = update_count.clone();
        let chooser_slot = chooser_slot.clone();
        add_photos_btn.connect_clicked(move |_| {
            let chooser = gtk::FileChooserNative::new(
                Some("Choisir des photos"),
                Some(&window),
                gtk::FileChooserAction::Open,
                Some("Ajouter"),
                Some("Annuler"),
            );
            chooser.set_select_multiple(true);
            let filter = gtk::FileFilter::new();
            filter.add_mime_type("image/*");
            filter.set_name(Some("Images"));
            chooser.add_filter(&filter);

            let wizard = wizard.clone();
            let overlay = overlay.clone();
            let append_photo_row = append_photo_row.clone();
            let update_count = update_count.clone();
            let chooser_slot2 = chooser_slot.clone();
            chooser.connect_response(move |dialog, resp| {
                if resp == gtk::ResponseType::Accept {
                    let mut candidates = Vec::new();
                    let files = dialog.files();
                    for i in 0..files.n_items() {
                        let Some(file) = files
                            .item(i)
                            .and_then(|o| o.downcast::<gtk::gio::File>().ok())
                        else {
                            continue;
                        };
                        let Some(path) = file.path() else { continue };
                        match PhotoAttachment::from_path(path) {
                            Ok(photo) => candidates.push(photo),
                            Err(e) => {
                                overlay.add_toast(adw::Toast::new(&format!(
                                    "Fichier illisible : {}",
                                    e
                                )));
                            }
                        }
                    }
                    let outcome = wizard.borrow_mut().photos.add(candidates);
                    for rejection in &outcome.rejected {
                        overlay.add_toast(adw::Toast::new(&rejection.to_string()));
                    }
                    if outcome.added > 0 {
                        let w = wizard.borrow();
                        let photos = w.photos.as_slice();
                        for photo in &photos[photos.len() - outcome.added..] {
                            (append_photo_row)(photo);
                        }
                    }
                    (update_count)();
                }
                chooser_slot2.borrow_mut().take();
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }

    // ----- navigation -----
    let nav = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let prev_btn = gtk::Button::with_label("Précédent");
    let next_btn = gtk::Button::with_label("Suivant");
    next_btn.add_css_class("suggested-action");
    let submit_btn = gtk::Button::with_label("Publier l'annonce");
    submit_btn.add_css_class("suggested-action");
    let spacer = gtk::Box::new(gtk::Orientation::Horizontal, 0);
    spacer.set_hexpand(true);
    nav.append(&prev_btn);
    nav.append(&spacer);
    nav.append(&next_btn);
    nav.append(&submit_btn);
    root.append(&nav);

    let show_step = {
        let wizard = wizard.clone();
        let stack = stack.clone();
        let step_label = step_label.clone();
        let prev_btn = prev_btn.clone();
        let next_btn = next_btn.clone();
        let submit_btn = submit_btn.clone();
        let recap_label = recap_label.clone();
        move || {
            let w = wizard.borrow();
            let step = w.step();
            let name = match step {
                WizardStep::General => "general",
                WizardStep::Cities => "cities",
                WizardStep::DetailsOptions => "details",
                WizardStep::PhotosReview => "photos",
            };
            stack.set_visible_child_name(name);
            step_label.set_label(&format!(
                "Étape {}/{} — {}",
                step.index() + 1,
                WizardStep::ALL.len(),
                step.title()
            ));
            prev_btn.set_sensitive(step.index() > 0);
            let last = step == WizardStep::PhotosReview;
            next_btn.set_visible(!last);
            submit_btn.set_visible(last);
            if last {
                recap_label.set_label(&recap_text(&w));
            }
        }
    };
    let show_step: Rc<dyn Fn()> = Rc::new(show_step);
    (show_step)();

    {
        let wizard = wizard.clone();
        let overlay = overlay.clone();
        let show_step = show_step.clone();
        next_btn.connect_clicked(move |_| {
            let result = wizard.borrow_mut().next();
            match result {
                Ok(_) => (show_step)(),
                Err(e) => overlay.add_toast(adw::Toast::new(&e.message)),
            }
        });
    }
    {
        let wizard = wizard.clone();
        let show_step = show_step.clone();
        prev_btn.connect_clicked(move |_| {
            wizard.borrow_mut().prev();
            (show_step)();
        });
    }

    {
        let wizard = wizard.clone();
        let overlay = overlay.clone();
        let window = window.clone();
        let session = session.clone();
        let submit_btn2 = submit_btn.clone();
        submit_btn.connect_clicked(move |_| {
            let plan = match wizard.borrow().submit() {
                Ok(plan) => plan,
                Err(WizardError::NotAtFinalStep) => {
                    overlay.add_toast(adw::Toast::new(
                        "Terminez les étapes avant de publier.",
                    ));
                    return;
                }
                Err(WizardError::Invalid(errors)) => {
                    for e in errors {
                        overlay.add_toast(adw::Toast::new(&e.message));
                    }
                    return;
                }
            };
            let Some((base_url, token)) = session.auth() else { return };
            submit_btn2.set_sensitive(false);

            let base_for_create = base_url.clone();
            let token_for_create = token.clone();
            let rx = crate::utils::run_async_to_main(async move {
                submit_listing(
                    &plan,
                    move |payload| {
                        let client = crate::api::client::ApiClient::new();
                        async move {
                            client.create_listing(&base_for_create, &token_for_create, &payload).await
                        }
                    },
                    move |listing_id, photos| {
                        let client = crate::api::client::ApiClient::new();
                        async move {
                            client
                                .upload_listing_photos(&base_url, &token, &listing_id, &photos)
                                .await
                        }
                    },
                )
                .await
            });

            let overlay2 = overlay.clone();
            let window2 = window.clone();
            let submit_btn3 = submit_btn2.clone();
            let on_created = on_created.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(listing) => {
                        let summary = listing.summary();
                        let _ = crate::storage::upsert_listings(std::slice::from_ref(&summary));
                        overlay2.add_toast(adw::Toast::new("Annonce publiée."));
                        (on_created)(summary);
                        window2.close();
                    }
                    Err(SubmitFailure::Photos { listing, error }) => {
                        // The listing exists without its photos; only the
                        // upload error is surfaced.
                        let summary = listing.summary();
                        let _ = crate::storage::upsert_listings(std::slice::from_ref(&summary));
                        crate::ui::toast_api_error(&overlay2, &error);
                        (on_created)(summary);
                        window2.close();
                    }
                    Err(SubmitFailure::Create(err)) => {
                        crate::ui::toast_api_error(&overlay2, &err);
                        submit_btn3.set_sensitive(true);
                    }
                }
                glib::ControlFlow::Continue
            });
        });
    }

    overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("Nouvelle annonce"));
    header.set_title_widget(Some(&title));
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();
}

fn attach_city_suggestions(entry: &gtk::Entry, list: &gtk::ListBox) {
    {
        let list = list.clone();
        entry.connect_changed(move |e| {
            while let Some(child) = list.first_child() {
                list.remove(&child);
            }
            for city in crate::forms::cities::suggest(&e.text()) {
                let row = gtk::ListBoxRow::new();
                let label = gtk::Label::new(Some(city));
                label.set_halign(gtk::Align::Start);
                row.set_child(Some(&label));
                list.append(&row);
            }
        });
    }
    let entry = entry.clone();
    list.connect_row_activated(move |list, row| {
        if let Some(label) = row.child().and_then(|c| c.downcast::<gtk::Label>().ok()) {
            entry.set_text(&label.text());
        }
        while let Some(child) = list.first_child() {
            list.remove(&child);
        }
    });
}

fn recap_text(wizard: &ListingWizard) -> String {
    let d = &wizard.draft;
    let ttype = d.type_transport.map(|t| t.label()).unwrap_or("—");
    let mut recap = format!(
        "{}\n{} · {} → {} · départ {}",
        d.titre,
        ttype,
        d.ville_depart,
        d.ville_arrivee,
        crate::utils::format_date(&d.date_debut)
    );
    if !d.budget.trim().is_empty() {
        recap.push_str(&format!(" · budget {} MAD", d.budget.trim()));
    }
    recap.push_str(&format!("\n{} photo(s) à envoyer", wizard.photos.len()));
    recap
}
