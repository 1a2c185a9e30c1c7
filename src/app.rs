use gtk4::prelude::*;
use gtk4::Application;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ui::{MainWindow, StartupState};

const APP_ID: &str = "com.pictor.ImageViewer";

pub struct PictorApp {
    app: Application,
}

impl PictorApp {
    pub fn new(startup: StartupState) -> Self {
        // Every invocation shows its own file list, so instances must not
        // be merged into one primary.
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::NON_UNIQUE)
            .build();

        // The window lives as long as the application runs.
        let startup = RefCell::new(Some(startup));
        let window: Rc<RefCell<Option<Rc<MainWindow>>>> = Rc::new(RefCell::new(None));
        app.connect_activate(move |app| {
            if let Some(window) = window.borrow().as_ref() {
                window.present();
                return;
            }
            let Some(startup) = startup.borrow_mut().take() else {
                return;
            };
            let main_window = MainWindow::new(app, startup);
            main_window.present();
            *window.borrow_mut() = Some(main_window);
        });

        Self { app }
    }

    /// Runs the main loop. Paths were already parsed, so GTK only sees the
    /// program name.
    pub fn run(&self) -> i32 {
        let program: Vec<String> = std::env::args().take(1).collect();
        self.app.run_with_args(&program).into()
    }
}
