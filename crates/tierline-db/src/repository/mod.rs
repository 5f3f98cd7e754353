//! # Repository Module
//!
//! Database repository implementations for Tierline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Storefront preview handler                                            │
//! │       │                                                                 │
//! │       │  db.discounts().list_active_for_shop("demo.myshopify.com")     │
//! │       ▼                                                                 │
//! │  DiscountRepository                                                    │
//! │  ├── list_active_for_shop(&self, shop)                                 │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── upsert(&self, shop, config)                                       │
//! │  └── set_status(&self, id, status)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ShopRepository`] - Installed shops and storefront settings
//! - [`DiscountRepository`] - Discount configurations
//! - [`CustomerRepository`] - Customer id to email lookup

pub mod customer;
pub mod discount;
pub mod shop;

pub use customer::CustomerRepository;
pub use discount::DiscountRepository;
pub use shop::ShopRepository;
