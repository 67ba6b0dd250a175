//! Domain models for the bookstore API.
//!
//! These types represent validated domain objects separate from database row
//! types. Those that leave the service as JSON derive `Serialize`.

pub mod address;
pub mod book;
pub mod cart;
pub mod order;
pub mod payment;
pub mod user;

pub use address::{Address, AddressInput, NewAddress, UserAddress};
pub use book::{Book, BookLine, NewBook};
pub use cart::{Cart, CartLine, CartView};
pub use order::{NewOrder, Order, OrderLine, OrderView};
pub use payment::{NewPayment, Payment, PaymentInput, PaymentSummary};
pub use user::{NewUser, User};
