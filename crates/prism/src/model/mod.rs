//! The typed object model.
//!
//! Objects own a root [`ContainerValue`]; containers own [`Item`]s; items own
//! values of one kind. Ownership is strictly downward: there are no parent
//! pointers, and paths are resolved from the object root.

mod binder;
mod equivalence;
mod item;
mod object;
mod value;

pub use binder::{bind, unbind, Binder};
pub use equivalence::Equivalence;
pub use item::{Item, ItemValues};
pub use object::PrismObject;
pub use value::{ContainerValue, PrismValue, PropertyValue, ReferenceValue};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, OnceLock};

    use prism_path::{ItemPath, QName};
    use prism_schema::constants::COMMON_NS;
    use prism_schema::{ItemDefinition, SchemaSnapshot};

    use super::PrismObject;
    use crate::context::PrismContext;

    pub fn ctx() -> PrismContext {
        static CTX: OnceLock<PrismContext> = OnceLock::new();
        CTX.get_or_init(|| PrismContext::with_defaults().expect("built-in schemas"))
            .clone()
    }

    pub fn snapshot() -> Arc<SchemaSnapshot> {
        ctx().snapshot()
    }

    pub fn item_def(snapshot: &SchemaSnapshot, type_local: &str, item: &str) -> Arc<ItemDefinition> {
        let ty = snapshot
            .find_complex_type(&QName::new(COMMON_NS, type_local))
            .expect("type");
        Arc::clone(ty.find_item(&QName::local(item)).expect("item"))
    }

    /// A user with an OID and a name.
    pub fn user_object(oid: &str, name: &str) -> PrismObject {
        let ctx = ctx();
        let mut user = PrismObject::instantiate(&ctx.snapshot(), &QName::local("user"))
            .expect("user element")
            .with_oid(oid);
        user.set_item_values(
            &ctx,
            &ItemPath::from_names(&["name"]),
            vec![ctx.poly_string(name).into()],
        )
        .expect("name");
        user
    }
}
