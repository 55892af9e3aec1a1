//! Screen-level orchestration
//!
//! Each flow composes the session, the typed endpoints, the query cache and
//! forms the way one screen of the app uses them.

pub mod auth;
pub mod chats;
pub mod order;
pub mod post;
pub mod search;

pub use auth::{boot, sign_out, SignIn};
pub use chats::{ChatRow, ChatsList};
pub use order::OrderForm;
pub use post::PostView;
pub use search::SearchResults;
