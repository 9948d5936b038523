//! Deltas: computing, applying and merging object changes.
//!
//! An [`ObjectDelta`] adds, modifies or deletes a whole object; a modify
//! carries [`ItemDelta`]s, each holding add, delete or replace value sets for
//! the item at one path.
//!
//! ```
//! use prism::context::PrismContext;
//! use prism::delta::{diff, DeltaBuilder};
//! use prism::model::PrismObject;
//! use prism_path::{ItemPath, QName};
//!
//! let ctx = PrismContext::with_defaults().unwrap();
//! let mut user = PrismObject::instantiate(&ctx.snapshot(), &QName::local("user"))
//!     .unwrap()
//!     .with_oid("u1");
//! let before = user.clone();
//!
//! let delta = DeltaBuilder::for_object(&user)
//!     .replace(ItemPath::from_names(&["description"]), ["Captain"])
//!     .add(ItemPath::from_names(&["employeeType"]), ["pirate", "captain"])
//!     .build();
//! delta.apply_to(&ctx, &mut user).unwrap();
//!
//! let again = diff(&ctx, &before, &user).unwrap();
//! let mut replay = before.clone();
//! again.apply_to(&ctx, &mut replay).unwrap();
//! assert!(replay.equivalent(&user, &ctx));
//! ```

mod apply;
mod builder;
mod codec;
mod diff;
mod item_delta;
mod object_delta;
mod summarize;

use std::sync::Arc;

use prism_path::{ItemPath, PathSegment};
use prism_schema::{ComplexTypeDefinition, ItemDefinition, SchemaSnapshot};

pub use apply::apply_item_delta;
pub use builder::DeltaBuilder;
pub use codec::DeltaCodec;
pub use diff::diff;
pub use item_delta::ItemDelta;
pub use object_delta::ObjectDelta;
pub use summarize::summarize;

/// The definition of the item at `path` under `object_type`, with the
/// complex type declaring it. Id segments are skipped.
pub(crate) fn resolve_item(
    snapshot: &SchemaSnapshot,
    object_type: &Arc<ComplexTypeDefinition>,
    path: &ItemPath,
) -> Option<(Arc<ComplexTypeDefinition>, Arc<ItemDefinition>)> {
    let mut names = path.segments().iter().filter_map(PathSegment::as_name).peekable();
    let mut owner = Arc::clone(object_type);
    while let Some(name) = names.next() {
        let def = Arc::clone(owner.find_item(name)?);
        if names.peek().is_none() {
            return Some((owner, def));
        }
        owner = snapshot.container_type_for(&owner, &def)?;
    }
    None
}
