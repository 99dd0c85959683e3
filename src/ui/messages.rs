use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::Conversation;
use crate::app::Session;
use crate::utils::TaskGuard;

struct ConversationList {
    root: gtk::Box,
    list: gtk::ListBox,
    items: RefCell<Vec<Conversation>>,
    on_selected: RefCell<Option<Box<dyn Fn(Conversation)>>>,
}

impl ConversationList {
    fn new() -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Conversations"));
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

    fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    fn connect_selected(&self, cb: impl Fn(Conversation) + 'static) {
        *self.on_selected.borrow_mut() = Some(Box::new(cb));
    }

    fn set_items(&self, items: Vec<Conversation>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        for conv in &items {
            let row = gtk::ListBoxRow::new();
            let cell = gtk::Box::new(gtk::Orientation::Vertical, 2);
            cell.set_margin_top(6);
            cell.set_margin_bottom(6);
            cell.set_margin_start(8);
            cell.set_margin_end(8);

            let head = gtk::Box::new(gtk::Orientation::Horizontal, 6);
            let name = gtk::Label::new(Some(&conv.interlocuteur));
            name.add_css_class("heading");
            name.set_halign(gtk::Align::Start);
            name.set_hexpand(true);
            head.append(&name);
            if conv.non_lus > 0 {
                let badge = gtk::Label::new(Some(&conv.non_lus.to_string()));
                badge.add_css_class("accent");
                head.append(&badge);
            }
            cell.append(&head);

            if let Some(last) = &conv.dernier_message {
                let preview = gtk::Label::new(Some(last));
                preview.add_css_class("dim-label");
                preview.set_halign(gtk::Align::Start);
                preview.set_ellipsize(gtk::pango::EllipsizeMode::End);
                cell.append(&preview);
            }

            row.set_child(Some(&cell));
            self.list.append(&row);
        }
        *self.items.borrow_mut() = items;
    }
}

pub fn show_messages_window(app: &Application, session: Session) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Messages")
        .default_width(900)
        .default_height(600)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let conv_list = ConversationList::new();
    split.set_flap(Some(&conv_list.widget()));

    // Thread pane
    let thread = gtk::Box::new(gtk::Orientation::Vertical, 6);
    thread.set_margin_top(8);
    thread.set_margin_bottom(8);
    thread.set_margin_start(8);
    thread.set_margin_end(8);

    let scroller = gtk::ScrolledWindow::builder().vexpand(true).hexpand(true).build();
    let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
    scroller.set_child(Some(&messages_box));
    thread.append(&scroller);

    let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
    let entry = gtk::Entry::new();
    entry.set_hexpand(true);
    entry.set_placeholder_text(Some("Votre message…"));
    let send_btn = gtk::Button::with_label("Envoyer");
    send_btn.add_css_class("suggested-action");
    input_row.append(&entry);
    input_row.append(&send_btn);
    thread.append(&input_row);

    split.set_content(Some(&thread));
    overlay.set_child(Some(&split));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("Messages"));
    header.set_title_widget(Some(&title));
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let my_id = session.user.as_ref().map(|u| u.id.clone()).unwrap_or_default();
    let current_conv: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let fetch_guard: Rc<RefCell<Option<TaskGuard>>> = Rc::new(RefCell::new(None));
    {
        let fetch_guard = fetch_guard.clone();
        window.connect_close_request(move |_| {
            fetch_guard.borrow_mut().take();
            glib::Propagation::Proceed
        });
    }

    let append_bubble = {
        let messages_box = messages_box.clone();
        let scroller = scroller.clone();
        move |text: &str, own: bool| {
            let label = gtk::Label::new(Some(text));
            label.set_wrap(true);
            label.set_halign(if own { gtk::Align::End } else { gtk::Align::Start });
            if own {
                label.add_css_class("accent");
            }
            messages_box.append(&label);
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper());
        }
    };
    let append_bubble: Rc<dyn Fn(&str, bool)> = Rc::new(append_bubble);

    // Conversation selection loads its thread.
    {
        let session = session.clone();
        let overlay = overlay.clone();
        let messages_box = messages_box.clone();
        let current_conv = current_conv.clone();
        let fetch_guard = fetch_guard.clone();
        let append_bubble = append_bubble.clone();
        let my_id = my_id.clone();
        conv_list.connect_selected(move |conv: Conversation| {
            *current_conv.borrow_mut() = Some(conv.id.clone());
            while let Some(child) = messages_box.first_child() {
                messages_box.remove(&child);
            }
            let Some((base_url, token)) = session.auth() else { return };
            let conv_id = conv.id.clone();
            let (rx, guard) = crate::utils::run_cancellable_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.messages(&base_url, &token, &conv_id).await
            });
            *fetch_guard.borrow_mut() = Some(guard);
            let overlay2 = overlay.clone();
            let append_bubble2 = append_bubble.clone();
            let my_id2 = my_id.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(messages) => {
                        for m in &messages {
                            (append_bubble2)(&m.contenu, m.expediteur_id == my_id2);
                        }
                    }
                    Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                }
                glib::ControlFlow::Continue
            });
        });
    }

    // Cached conversations first, then the network copy.
    if let Ok(cached) = crate::storage::get_conversations(Some(200)) {
        if !cached.is_empty() {
            conv_list.set_items(cached);
        }
    }
    {
        let Some((base_url, token)) = session.auth() else { return };
        let rx = crate::utils::run_async_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            match client.conversations(&base_url, &token).await {
                Ok(items) => {
                    let _ = crate::storage::upsert_conversations(&items);
                    Ok(items)
                }
                Err(e) => Err(e),
            }
        });
        let overlay2 = overlay.clone();
        let conv_list2 = conv_list.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(items) => conv_list2.set_items(items),
                Err(err) => crate::ui::toast_api_error(&overlay2, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    // Send actions
    {
        let entry_for_send = entry.clone();
        let overlay = overlay.clone();
        let session = session.clone();
        let current_conv = current_conv.clone();
        let append_bubble = append_bubble.clone();
        let send: Rc<dyn Fn()> = Rc::new(move || {
            let text = entry_for_send.text().to_string();
            if text.trim().is_empty() {
                return;
            }
            let Some(conv_id) = current_conv.borrow().clone() else {
                overlay.add_toast(adw::Toast::new("Choisissez une conversation."));
                return;
            };
            let Some((base_url, token)) = session.auth() else { return };
            let body = text.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.send_message(&base_url, &token, &conv_id, &body).await
            });
            let overlay2 = overlay.clone();
            let entry2 = entry_for_send.clone();
            let append_bubble2 = append_bubble.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(message) => {
                        (append_bubble2)(&message.contenu, true);
                        entry2.set_text("");
                    }
                    Err(err) => crate::ui::toast_api_error(&overlay2, &err),
                }
                glib::ControlFlow::Continue
            });
        });
        {
            let send = send.clone();
            send_btn.connect_clicked(move |_| (send)());
        }
        {
            let send = send.clone();
            let entry_for_activate = entry.clone();
            entry_for_activate.connect_activate(move |_| (send)());
        }
    }
}
