mod dispatch;
mod file;
mod mode;

pub use dispatch::{OpenDispatch, OpenedFile};
pub use file::{Lines, TextLines, VirtualFile};
pub use mode::OpenMode;
