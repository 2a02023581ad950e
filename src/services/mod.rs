// Accounts and authentication
pub mod accounts;

// Catalog
pub mod catalog;
pub mod packs;

// Shopping
pub mod cart;
pub mod orders;

// Back office
pub mod admin;
pub mod contact;
