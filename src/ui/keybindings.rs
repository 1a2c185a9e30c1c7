// Keybindings for the pictor image viewer
//
// Keybindings:
// - n / Right / l / Space: Next image       - p / Left / h / BackSpace: Previous image
// - g: First image (or [count]g)             - G: Last image
// - + / =: Zoom in                           - -: Zoom out
// - Z: Native size (or [count]Z, 0N = 1/N)   - w / e / E: Fit / fit width / fit height
// - a: Toggle animation                      - O: Toggle overzoom
// - s: Toggle slideshow                      - y / Y: Copy name / absolute path
// - :: Open command line                     - /: Search file names
// - Escape: Clear count / close command line  - q: Quit
// Digits typed before a key form its numeric prefix.

use gdk4::Key;
use gtk4::prelude::*;
use gtk4::{EventControllerKey, PropagationPhase, Widget};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::viewer::{Command, CountBuffer, FitMode, ListEnd, ZoomTarget};

/// Where key presses currently go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Image,
    CommandLine,
}

/// What a single key press asks for
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Run(Command),
    Digit(char),
    /// Open the command line prefilled with `:` or `/`
    OpenCommandLine(char),
    Cancel,
}

/// Map a key in image mode to its action
pub fn action_for_key(keyval: Key) -> Option<KeyAction> {
    let next = Command::Move {
        delta: 1,
        count: None,
        force: false,
    };
    let prev = Command::Move {
        delta: -1,
        count: None,
        force: false,
    };

    let action = match keyval {
        Key::Escape => KeyAction::Cancel,
        Key::colon => KeyAction::OpenCommandLine(':'),
        Key::slash | Key::KP_Divide => KeyAction::OpenCommandLine('/'),
        Key::n | Key::l | Key::Right | Key::space => KeyAction::Run(next),
        Key::p | Key::h | Key::Left | Key::BackSpace => KeyAction::Run(prev),
        Key::g | Key::Home => KeyAction::Run(Command::Jump {
            position: None,
            fallback: ListEnd::First,
            force: false,
        }),
        Key::G | Key::End => KeyAction::Run(Command::Jump {
            position: None,
            fallback: ListEnd::Last,
            force: false,
        }),
        Key::plus | Key::equal | Key::KP_Add => KeyAction::Run(Command::ZoomIn),
        Key::minus | Key::KP_Subtract => KeyAction::Run(Command::ZoomOut),
        Key::Z => KeyAction::Run(Command::Zoom(ZoomTarget::Percent(1.0))),
        Key::w => KeyAction::Run(Command::Zoom(ZoomTarget::Fit(FitMode::Both))),
        Key::e => KeyAction::Run(Command::Zoom(ZoomTarget::Fit(FitMode::Width))),
        Key::E => KeyAction::Run(Command::Zoom(ZoomTarget::Fit(FitMode::Height))),
        Key::a => KeyAction::Run(Command::ToggleAnimation),
        Key::O => KeyAction::Run(Command::ToggleOverzoom),
        Key::s => KeyAction::Run(Command::Slideshow),
        Key::y => KeyAction::Run(Command::CopyName { absolute: false }),
        Key::Y => KeyAction::Run(Command::CopyName { absolute: true }),
        Key::q => KeyAction::Run(Command::Quit),
        other => {
            let digit = other.to_unicode().filter(char::is_ascii_digit)?;
            KeyAction::Digit(digit)
        }
    };
    Some(action)
}

/// Callback type for running a command
pub type CommandCallback = Box<dyn Fn(Command)>;
/// Callback type for opening the command line
pub type OpenCommandLineCallback = Box<dyn Fn(char)>;
/// Callback type for closing the command line
pub type CloseCommandLineCallback = Box<dyn Fn()>;

/// Keybinding manager for the image window
pub struct Keybindings {
    controller: EventControllerKey,
    mode: Rc<Cell<InputMode>>,
    count: Rc<RefCell<CountBuffer>>,
    on_command: Rc<RefCell<Option<CommandCallback>>>,
    on_open_command_line: Rc<RefCell<Option<OpenCommandLineCallback>>>,
    on_close_command_line: Rc<RefCell<Option<CloseCommandLineCallback>>>,
}

impl Keybindings {
    /// Create a keybinding manager feeding digits into `count`
    pub fn new(count: Rc<RefCell<CountBuffer>>) -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let mode = Rc::new(Cell::new(InputMode::Image));
        let on_command: Rc<RefCell<Option<CommandCallback>>> = Rc::new(RefCell::new(None));
        let on_open_command_line: Rc<RefCell<Option<OpenCommandLineCallback>>> =
            Rc::new(RefCell::new(None));
        let on_close_command_line: Rc<RefCell<Option<CloseCommandLineCallback>>> =
            Rc::new(RefCell::new(None));

        let mode_clone = mode.clone();
        let count_clone = count.clone();
        let on_command_clone = on_command.clone();
        let on_open_clone = on_open_command_line.clone();
        let on_close_clone = on_close_command_line.clone();

        controller.connect_key_pressed(move |_controller, keyval, _keycode, _state| {
            let handled = Self::handle_key_press(
                keyval,
                &mode_clone,
                &count_clone,
                &on_command_clone,
                &on_open_clone,
                &on_close_clone,
            );

            if handled {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });

        Self {
            controller,
            mode,
            count,
            on_command,
            on_open_command_line,
            on_close_command_line,
        }
    }

    /// Attach keybindings to a widget (typically the main window)
    pub fn attach(&self, widget: &impl IsA<Widget>) {
        widget.add_controller(self.controller.clone());
    }

    pub fn set_mode(&self, mode: InputMode) {
        self.mode.set(mode);
    }

    /// Digits typed so far
    pub fn pending_count(&self) -> String {
        self.count.borrow().as_str().to_string()
    }

    /// Connect callback for commands bound to keys
    pub fn connect_command<F>(&self, callback: F)
    where
        F: Fn(Command) + 'static,
    {
        *self.on_command.borrow_mut() = Some(Box::new(callback));
    }

    /// Connect callback for opening the command line
    pub fn connect_open_command_line<F>(&self, callback: F)
    where
        F: Fn(char) + 'static,
    {
        *self.on_open_command_line.borrow_mut() = Some(Box::new(callback));
    }

    /// Connect callback for closing the command line
    pub fn connect_close_command_line<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.on_close_command_line.borrow_mut() = Some(Box::new(callback));
    }

    /// Handle a key press event
    fn handle_key_press(
        keyval: Key,
        mode: &Rc<Cell<InputMode>>,
        count: &Rc<RefCell<CountBuffer>>,
        on_command: &Rc<RefCell<Option<CommandCallback>>>,
        on_open_command_line: &Rc<RefCell<Option<OpenCommandLineCallback>>>,
        on_close_command_line: &Rc<RefCell<Option<CloseCommandLineCallback>>>,
    ) -> bool {
        // The entry gets everything but Escape while the command line is open
        if mode.get() == InputMode::CommandLine {
            if keyval == Key::Escape {
                mode.set(InputMode::Image);
                if let Some(ref callback) = *on_close_command_line.borrow() {
                    callback();
                }
                return true;
            }
            return false;
        }

        let Some(action) = action_for_key(keyval) else {
            return false;
        };

        match action {
            KeyAction::Digit(digit) => {
                count.borrow_mut().push(digit);
            }
            KeyAction::Cancel => count.borrow_mut().clear(),
            KeyAction::OpenCommandLine(prefix) => {
                mode.set(InputMode::CommandLine);
                if let Some(ref callback) = *on_open_command_line.borrow() {
                    callback(prefix);
                }
            }
            KeyAction::Run(command) => {
                if let Some(ref callback) = *on_command.borrow() {
                    callback(command);
                }
            }
        }
        true
    }
}
