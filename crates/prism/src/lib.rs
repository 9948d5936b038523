//! prism - a schema-aware object model.
//!
//! Documents are parsed by a codec into an [`xnode::XNode`] pivot tree, bound
//! against the schema registry into typed [`model::PrismObject`]s, compared
//! under per-item matching rules, and changed through [`delta::ObjectDelta`]s
//! that can be computed, applied, merged and serialized.
//!
//! ```
//! use prism::codec::JsonCodec;
//! use prism::context::PrismContext;
//! use prism::model::{bind, unbind};
//!
//! let ctx = PrismContext::with_defaults().unwrap();
//! let json = JsonCodec::from_context(&ctx);
//! let doc = json
//!     .read_document(r#"{"user": {"oid": "u1", "name": "jack", "employeeType": "pirate"}}"#)
//!     .unwrap();
//! let user = bind(&ctx, &doc).unwrap();
//! assert_eq!(user.oid(), Some("u1"));
//!
//! let again = bind(&ctx, &unbind(&ctx, &user).unwrap()).unwrap();
//! assert!(again.equivalent(&user, &ctx));
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod context;
pub mod delta;
pub mod error;
pub mod matching;
pub mod model;
pub mod value;
pub mod xnode;

// Re-exports for convenience
pub use config::PrismConfig;
pub use context::PrismContext;
pub use delta::{diff, summarize, DeltaBuilder, ItemDelta, ObjectDelta};
pub use error::{PrismError, Result};
pub use model::{PrismObject, PrismValue};
