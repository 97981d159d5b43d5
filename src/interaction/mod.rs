pub mod click;
pub mod event;
pub mod keyboard;
pub mod select;
pub mod wait;

pub use click::{click, ClickCount};
pub use event::{dispatch_event, EventTarget};
pub use keyboard::{fill, press};
pub use select::{select_option, SelectBy};
pub use wait::{wait_for, WaitState};
