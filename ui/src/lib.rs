pub mod html;
pub mod reports;
pub mod text;
