//! Helper functions shared by the assemblers and the views

mod date;
mod html;
mod text;
mod url;

pub use self::date::*;
pub use self::html::*;
pub use self::text::*;
pub use self::url::*;
