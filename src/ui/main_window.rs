use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::ListingSummary;
use crate::app::Session;
use crate::utils::TaskGuard;

pub struct ListingList {
    root: gtk::Box,
    list: gtk::ListBox,
    items: RefCell<Vec<ListingSummary>>,
    on_selected: RefCell<Option<Box<dyn Fn(ListingSummary)>>>,
}

impl ListingList {
    pub fn new() -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Annonces"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let scroller = gtk::ScrolledWindow::builder().vexpand(true).build();
        let list = gtk::ListBox::new();
        scroller.set_child(Some(&list));
        root.append(&scroller);

        let this = Rc::new(Self {
            root,
            list,
            items: RefCell::new(Vec::new()),
            on_selected: RefCell::new(None),
        });

        {
            let this2 = this.clone();
            this.list.connect_row_activated(move |_, row| {
                let idx = row.index();
                if idx < 0 {
                    return;
                }
                let item = this2.items.borrow().get(idx as usize).cloned();
                if let (Some(item), Some(cb)) = (item, this2.on_selected.borrow().as_ref()) {
                    cb(item);
                }
            });
        }

        this
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn connect_selected(&self, cb: impl Fn(ListingSummary) + 'static) {
        *self.on_selected.borrow_mut() = Some(Box::new(cb));
    }

    pub fn set_items(&self, items: Vec<ListingSummary>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        for l in &items {
            let row = gtk::ListBoxRow::new();
            let cell = gtk::Box::new(gtk::Orientation::Vertical, 2);
            cell.set_margin_top(6);
            cell.set_margin_bottom(6);
            cell.set_margin_start(8);
            cell.set_margin_end(8);

            let titre = gtk::Label::new(Some(&l.titre));
            titre.add_css_class("heading");
            titre.set_halign(gtk::Align::Start);
            titre.set_ellipsize(gtk::pango::EllipsizeMode::End);
            cell.append(&titre);

            let route = gtk::Label::new(Some(&format!(
                "{} → {} · {}",
                l.ville_depart,
                l.ville_arrivee,
                crate::utils::format_date(&l.date_debut)
            )));
            route.add_css_class("dim-label");
            route.set_halign(gtk::Align::Start);
            cell.append(&route);

            if l.urgent {
                let badge = gtk::Label::new(Some("URGENT"));
                badge.add_css_class("error");
                badge.set_halign(gtk::Align::Start);
                cell.append(&badge);
            }

            row.set_child(Some(&cell));
            self.list.append(&row);
        }
        *self.items.borrow_mut() = items;
    }

    pub fn upsert(&self, item: ListingSummary) {
        let mut items = self.items.borrow().clone();
        items.retain(|l| l.id != item.id);
        items.insert(0, item);
        self.set_items(items);
    }
}

pub fn show_main_window(app: &Application, session: Session) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Pro-Trans")
        .default_width(1000)
        .default_height(680)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = gtk::Box::new(gtk::Orientation::Vertical, 6);
    sidebar.set_margin_top(8);
    sidebar.set_margin_start(8);
    sidebar.set_margin_end(8);

    // City search over the browse endpoint
    let depart_entry = gtk::Entry::new();
    depart_entry.set_placeholder_text(Some("Ville de départ"));
    let arrivee_entry = gtk::Entry::new();
    arrivee_entry.set_placeholder_text(Some("Ville d'arrivée"));
    let search_btn = gtk::Button::with_label("Rechercher");
    sidebar.append(&depart_entry);
    sidebar.append(&arrivee_entry);
    sidebar.append(&search_btn);
    let mine_check = gtk::CheckButton::with_label("Mes annonces uniquement");
    sidebar.append(&mine_check);

    let listing_list = ListingList::new();
    sidebar.append(&listing_list.widget());
    split.set_flap(Some(&sidebar));

    let detail = crate::ui::listing_detail::DetailView::new(&overlay, session.clone());
    split.set_content(Some(&detail.widget()));

    {
        let detail = detail.clone();
        listing_list.connect_selected(move |l| {
            crate::ui::listing_detail::DetailView::load(&detail, &l.id)
        });
    }

    overlay.set_child(Some(&split));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("Pro-Trans"));
    header.set_title_widget(Some(&title));

    let is_client = session.user.as_ref().map(|u| u.role == "client").unwrap_or(false);
    let new_listing_btn = gtk::Button::with_label("Nouvelle annonce");
    new_listing_btn.add_css_class("suggested-action");
    if is_client {
        header.pack_end(&new_listing_btn);
    }
    let is_transporteur = session
        .user
        .as_ref()
        .map(|u| u.role == "transporteur")
        .unwrap_or(false);
    let my_quotes_btn = gtk::Button::with_label("Mes devis");
    if is_transporteur {
        header.pack_end(&my_quotes_btn);
    }
    let messages_btn = gtk::Button::with_label("Messages");
    header.pack_end(&messages_btn);
    let profile_btn = gtk::Button::with_label("Profil");
    header.pack_end(&profile_btn);
    let logout_btn = gtk::Button::with_label("Déconnexion");
    header.pack_start(&logout_btn);

    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    // The refresh in flight dies with the window.
    let fetch_guard: Rc<RefCell<Option<TaskGuard>>> = Rc::new(RefCell::new(None));
    {
        let fetch_guard = fetch_guard.clone();
        window.connect_close_request(move |_| {
            fetch_guard.borrow_mut().take();
            glib::Propagation::Proceed
        });
    }

    let refresh = {
        let overlay = overlay.clone();
        let listing_list = listing_list.clone();
        let session = session.clone();
        let fetch_guard = fetch_guard.clone();
        let depart_entry = depart_entry.clone();
        let arrivee_entry = arrivee_entry.clone();
        let mine_check = mine_check.clone();
        move || {
            let Some((base_url, token)) = session.auth() else { return };
            let depart = depart_entry.text().trim().to_string();
            let arrivee = arrivee_entry.text().trim().to_string();
            let only_mine = mine_check.is_active();
            let (rx, guard) = crate::utils::run_cancellable_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                let depart = (!depart.is_empty()).then_some(depart);
                let arrivee = (!arrivee.is_empty()).then_some(arrivee);
                let result = if only_mine {
                    client.my_listings(&base_url, &token).await
                } else {
                    client
                        .listings(&base_url, &token, depart.as_deref(), arrivee.as_deref())
                        .await
                };
                match result {
                    Ok(items) => {
                        let _ = crate::storage::upsert_listings(&items);
                        Ok(items)
                    }
                    Err(e) => Err(e),
                }
            });
            *fetch_guard.borrow_mut() = Some(guard);
            let overlay2 = overlay.clone();
            let listing_list2 = listing_list.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(items) => listing_list2.set_items(items),
                    Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                }
                glib::ControlFlow::Continue
            });
        }
    };
    let refresh: Rc<dyn Fn()> = Rc::new(refresh);

    // Cached listings first, then the network copy.
    if let Ok(cached) = crate::storage::get_listings(Some(200)) {
        if !cached.is_empty() {
            listing_list.set_items(cached);
        }
    }
    (refresh)();

    {
        let refresh = refresh.clone();
        search_btn.connect_clicked(move |_| (refresh)());
    }
    {
        let refresh = refresh.clone();
        mine_check.connect_toggled(move |_| (refresh)());
    }

    {
        let app = app.clone();
        let session = session.clone();
        let listing_list = listing_list.clone();
        new_listing_btn.connect_clicked(move |_| {
            let listing_list = listing_list.clone();
            crate::ui::listing_wizard::show_wizard_window(
                &app,
                session.clone(),
                Rc::new(move |summary| listing_list.upsert(summary)),
            );
        });
    }
    {
        let app = app.clone();
        let session = session.clone();
        messages_btn.connect_clicked(move |_| {
            crate::ui::messages::show_messages_window(&app, session.clone());
        });
    }
    {
        let window = window.clone();
        let overlay = overlay.clone();
        let session = session.clone();
        my_quotes_btn.connect_clicked(move |_| {
            show_my_quotes_dialog(&window, &overlay, &session);
        });
    }
    {
        let app = app.clone();
        let session = session.clone();
        profile_btn.connect_clicked(move |_| {
            crate::ui::profile::show_profile_window(&app, session.clone());
        });
    }
    {
        let app = app.clone();
        let window = window.clone();
        let overlay = overlay.clone();
        logout_btn.connect_clicked(move |_| {
            let mut session = Session::load();
            if let Err(e) = session.logout() {
                overlay.add_toast(adw::Toast::new(&format!("Déconnexion impossible : {}", e)));
                return;
            }
            crate::ui::login::show_login_window(&app);
            window.close();
        });
    }
}

/// Quotes the signed-in transporter has sent, with their current status.
fn show_my_quotes_dialog(
    parent: &adw::ApplicationWindow,
    overlay: &adw::ToastOverlay,
    session: &Session,
) {
    let dialog = gtk::Dialog::builder()
        .title("Mes devis")
        .transient_for(parent)
        .modal(true)
        .default_width(420)
        .default_height(420)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 8);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let scroller = gtk::ScrolledWindow::builder().vexpand(true).build();
    let list = gtk::ListBox::new();
    scroller.set_child(Some(&list));
    content.append(&scroller);
    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Fermer", gtk::ResponseType::Close);
    dialog.connect_response(|dlg, _| dlg.close());

    if let Some((base_url, token)) = session.auth() {
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.my_quotes(&base_url, &token).await
        });
        let overlay = overlay.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(quotes) => {
                    for quote in &quotes {
                        let row = gtk::ListBoxRow::new();
                        row.set_activatable(false);
                        let cell = gtk::Box::new(gtk::Orientation::Vertical, 2);
                        cell.set_margin_top(6);
                        cell.set_margin_bottom(6);
                        cell.set_margin_start(8);
                        cell.set_margin_end(8);
                        let statut = match quote.statut.as_deref() {
                            Some("acceptee") => "accepté",
                            Some("refusee") => "refusé",
                            _ => "en attente",
                        };
                        let head =
                            gtk::Label::new(Some(&format!("{} MAD — {}", quote.montant, statut)));
                        head.set_halign(gtk::Align::Start);
                        cell.append(&head);
                        if let Some(msg) = &quote.message {
                            let body = gtk::Label::new(Some(msg));
                            body.add_css_class("dim-label");
                            body.set_halign(gtk::Align::Start);
                            body.set_ellipsize(gtk::pango::EllipsizeMode::End);
                            cell.append(&body);
                        }
                        row.set_child(Some(&cell));
                        list.append(&row);
                    }
                }
                Err(err) => crate::ui::toast_api_error(&overlay, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    dialog.present();
}
