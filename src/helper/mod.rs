pub mod page_helpers;
pub mod public_helpers;
pub mod rich_text;
