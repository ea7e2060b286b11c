pub mod auth_account;
pub mod document;

pub use auth_account::Entity as AuthAccount;
pub use document::Entity as Document;
