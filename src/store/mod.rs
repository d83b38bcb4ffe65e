// Document store abstraction and the Firestore REST implementation

pub mod provider;
pub mod value;
pub mod firestore;

pub use provider::*;
pub use value::{render_fields, FieldValue, Fields};
pub use firestore::FirestoreClient;
