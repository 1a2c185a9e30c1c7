// Main window for the pictor image viewer
// ApplicationWindow with a scrollable Picture, a status bar and a hidden
// command line. All viewing logic lives in `ImageController`.

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, ContentFit, CssProvider, Entry, Label,
    Orientation, Picture, PolicyType, ScrolledWindow, Settings as GtkSettings,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use super::keybindings::{InputMode, Keybindings};
use super::surface::{
    GlibScheduler, PictureSurface, StatusBar, WindowViewport, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
use crate::config::Settings;
use crate::image_loader::ImageDecoder;
use crate::viewer::{
    parse_command, Command, CountBuffer, ImageController, StatusReporter, ViewerContext,
    ViewerOptions,
};

const CSS: &str = r#"
window {
    background-color: #101010;
}

.status-bar {
    background-color: #1a1a1a;
    padding: 2px 8px;
}

.status-bar label {
    color: #d0d0d0;
    font-family: monospace;
}

.status-bar label.error {
    color: #ff5555;
}

.count {
    color: #00ff88;
}

entry.command-line {
    font-family: monospace;
    border-radius: 0;
}
"#;

/// Load and apply the stylesheet
fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// What the window starts with
pub struct StartupState {
    pub paths: Vec<PathBuf>,
    pub index: usize,
    pub settings: Settings,
    /// Problem with the config file, shown once the window is up
    pub warning: Option<String>,
}

/// Main window of the image viewer
pub struct MainWindow {
    window: ApplicationWindow,
    scroller: ScrolledWindow,
    status: Rc<StatusBar>,
    count_label: Label,
    command_entry: Entry,
    keybindings: Keybindings,
    controller: Rc<RefCell<ImageController>>,
    copy_to_primary: bool,
    last_viewport: Cell<(i32, i32)>,
}

impl MainWindow {
    pub fn new(app: &Application, startup: StartupState) -> Rc<Self> {
        load_css();
        if let Some(settings) = GtkSettings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }

        let window = ApplicationWindow::builder()
            .application(app)
            .title("pictor")
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .build();

        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Fill);
        picture.set_can_shrink(false);
        picture.set_halign(Align::Center);
        picture.set_valign(Align::Center);

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Automatic)
            .vscrollbar_policy(PolicyType::Automatic)
            .hexpand(true)
            .vexpand(true)
            .child(&picture)
            .build();

        // Status bar
        let status_bar = GtkBox::new(Orientation::Horizontal, 8);
        status_bar.add_css_class("status-bar");

        let message_label = Label::new(None);
        message_label.set_halign(Align::Start);
        message_label.set_hexpand(true);
        message_label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
        status_bar.append(&message_label);

        let count_label = Label::new(None);
        count_label.add_css_class("count");
        count_label.set_halign(Align::End);
        status_bar.append(&count_label);

        let position_label = Label::new(None);
        position_label.set_halign(Align::End);
        position_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        status_bar.append(&position_label);

        let command_entry = Entry::new();
        command_entry.add_css_class("command-line");
        command_entry.set_visible(false);

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.append(&scroller);
        content.append(&status_bar);
        content.append(&command_entry);
        window.set_child(Some(&content));

        let count = Rc::new(RefCell::new(CountBuffer::default()));
        let status = Rc::new(StatusBar::new(message_label, position_label));
        let scheduler = Rc::new(GlibScheduler::new());
        let ctx = ViewerContext {
            decoder: Rc::new(ImageDecoder),
            surface: Rc::new(PictureSurface::new(picture)),
            status: status.clone(),
            viewport: Rc::new(WindowViewport::new(window.clone(), status_bar)),
            scheduler: scheduler.clone(),
            thumbnail_mode: Rc::new(Cell::new(false)),
            count: count.clone(),
        };
        let mut controller = ImageController::new(ctx, ViewerOptions::from(&startup.settings));
        controller.set_shuffle(startup.settings.general.shuffle);
        let controller = Rc::new(RefCell::new(controller));

        // Expired timers go back into the controller; it is never borrowed
        // while the main loop dispatches them.
        let weak_controller = Rc::downgrade(&controller);
        scheduler.connect_expired(move |id| {
            let Some(controller) = weak_controller.upgrade() else {
                return;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => controller.on_timer(id),
                Err(_) => tracing::warn!(?id, "Dropped timer while controller busy"),
            };
        });

        let main_window = Rc::new(Self {
            window,
            scroller,
            status,
            count_label,
            command_entry,
            keybindings: Keybindings::new(count),
            controller,
            copy_to_primary: startup.settings.general.copy_to_primary,
            last_viewport: Cell::new((0, 0)),
        });

        main_window.setup_keybindings();
        main_window.setup_command_line();
        main_window.setup_resize_observer();

        // Load once the window has a size so the first fit is right
        let weak_self = Rc::downgrade(&main_window);
        let StartupState {
            paths,
            index,
            warning,
            ..
        } = startup;
        glib::idle_add_local_once(move || {
            if let Some(window) = weak_self.upgrade() {
                window.controller.borrow_mut().set_paths(paths, index);
                if let Some(warning) = warning {
                    window.status.error(&format!("Warning: {warning}"));
                }
            }
        });

        main_window
    }

    fn setup_keybindings(self: &Rc<Self>) {
        self.keybindings.attach(&self.window);

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_command(move |command| {
            if let Some(window) = window_weak.upgrade() {
                window.run_command(command);
            }
        });

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_open_command_line(move |prefix| {
            if let Some(window) = window_weak.upgrade() {
                window.open_command_line(prefix);
            }
        });

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_close_command_line(move || {
            if let Some(window) = window_weak.upgrade() {
                window.close_command_line();
            }
        });

        // Show the pending count after every key
        let window_weak = Rc::downgrade(self);
        let controller = gtk4::EventControllerKey::new();
        controller.connect_key_released(move |_, _, _, _| {
            if let Some(window) = window_weak.upgrade() {
                window.update_count_label();
            }
        });
        self.window.add_controller(controller);
    }

    fn setup_command_line(self: &Rc<Self>) {
        let window_weak: Weak<Self> = Rc::downgrade(self);
        self.command_entry.connect_activate(move |entry| {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            let line = entry.text().to_string();
            window.close_command_line();
            match parse_command(&line) {
                Ok(command) => window.run_command(command),
                Err(err) => window.status.error(&format!("Error: {err}")),
            }
        });
    }

    /// Refit when the area available to the image changes
    fn setup_resize_observer(self: &Rc<Self>) {
        let weak_self = Rc::downgrade(self);
        self.scroller.add_tick_callback(move |scroller, _clock| {
            if let Some(window) = weak_self.upgrade() {
                let size = (scroller.width(), scroller.height());
                if size.0 > 0 && size.1 > 0 && size != window.last_viewport.get() {
                    window.last_viewport.set(size);
                    if let Ok(mut controller) = window.controller.try_borrow_mut() {
                        controller.refit();
                    }
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn run_command(&self, command: Command) {
        self.status.clear_message();
        match command {
            Command::Quit => self.window.close(),
            Command::CopyName { absolute } => self.copy_name(absolute),
            command => self.controller.borrow_mut().execute(command),
        }
        self.update_count_label();
    }

    fn copy_name(&self, absolute: bool) {
        let Some(text) = self.controller.borrow().clipboard_text(absolute) else {
            self.status.error("Error: no images in the file list");
            return;
        };
        let display = WidgetExt::display(&self.window);
        let clipboard = if self.copy_to_primary {
            display.primary_clipboard()
        } else {
            display.clipboard()
        };
        clipboard.set_text(&text);
        self.status.info(&format!("Copied {text}"));
    }

    fn open_command_line(&self, prefix: char) {
        self.command_entry.set_text(&prefix.to_string());
        self.command_entry.set_visible(true);
        self.command_entry.grab_focus();
        self.command_entry.set_position(-1);
    }

    fn close_command_line(&self) {
        self.keybindings.set_mode(InputMode::Image);
        self.command_entry.set_visible(false);
        self.command_entry.set_text("");
        self.window.grab_focus();
    }

    fn update_count_label(&self) {
        self.count_label.set_text(&self.keybindings.pending_count());
    }

    pub fn present(&self) {
        self.window.present();
    }
}
