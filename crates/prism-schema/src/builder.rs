//! Fluent construction of [`SchemaSource`] documents in code.

use crate::definition::PrimitiveType;
use crate::source::{
    ComplexTypeSource, ElementSource, ItemSource, MaxOccursSource, SchemaSource, SimpleTypeSource,
};

/// Builder for a whole schema source.
///
/// ```
/// use prism_schema::SchemaSourceBuilder;
///
/// let source = SchemaSourceBuilder::new("urn:example:ext")
///     .prefix("ext", "urn:example:ext")
///     .complex_type("UserExtensionType", |t| {
///         t.extension_of("c:UserType")
///             .item("ship", "xsd:string")
///             .multi_item("weapon", "xsd:string")
///     })
///     .build();
/// assert_eq!(source.complex_types[0].items.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SchemaSourceBuilder {
    source: SchemaSource,
}

impl SchemaSourceBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            source: SchemaSource::new(namespace),
        }
    }

    pub fn prefix(mut self, prefix: &str, namespace: &str) -> Self {
        self.source.prefixes.insert(prefix, namespace);
        self
    }

    pub fn simple_type(
        mut self,
        name: &str,
        primitive: PrimitiveType,
        matching_rule: Option<&str>,
    ) -> Self {
        self.source.simple_types.push(SimpleTypeSource {
            name: name.to_string(),
            primitive: Some(primitive),
            reference: false,
            matching_rule: matching_rule.map(str::to_string),
        });
        self
    }

    pub fn reference_type(mut self, name: &str) -> Self {
        self.source.simple_types.push(SimpleTypeSource {
            name: name.to_string(),
            primitive: None,
            reference: true,
            matching_rule: None,
        });
        self
    }

    pub fn complex_type(
        mut self,
        name: &str,
        f: impl FnOnce(ComplexTypeBuilder) -> ComplexTypeBuilder,
    ) -> Self {
        let builder = f(ComplexTypeBuilder::new(name));
        self.source.complex_types.push(builder.ty);
        self
    }

    pub fn element(mut self, name: &str, type_name: &str) -> Self {
        self.source.elements.push(ElementSource {
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
        self
    }

    pub fn build(self) -> SchemaSource {
        self.source
    }
}

/// Builder for one complex type.
#[derive(Debug, Clone)]
pub struct ComplexTypeBuilder {
    ty: ComplexTypeSource,
}

impl ComplexTypeBuilder {
    fn new(name: &str) -> Self {
        Self {
            ty: ComplexTypeSource {
                name: name.to_string(),
                ..ComplexTypeSource::default()
            },
        }
    }

    pub fn base(mut self, base: &str) -> Self {
        self.ty.base = Some(base.to_string());
        self
    }

    pub fn object(mut self) -> Self {
        self.ty.object = true;
        self
    }

    pub fn extension_of(mut self, object_type: &str) -> Self {
        self.ty.extension_of = Some(object_type.to_string());
        self
    }

    /// Optional single-valued item.
    pub fn item(self, name: &str, type_name: &str) -> Self {
        self.item_with(name, type_name, 0, MaxOccursSource::Count(1), None)
    }

    /// Optional multi-valued item.
    pub fn multi_item(self, name: &str, type_name: &str) -> Self {
        self.item_with(
            name,
            type_name,
            0,
            MaxOccursSource::Keyword("unbounded".into()),
            None,
        )
    }

    /// Single-valued item with an explicit matching rule.
    pub fn matched_item(self, name: &str, type_name: &str, rule: &str) -> Self {
        self.item_with(name, type_name, 0, MaxOccursSource::Count(1), Some(rule))
    }

    pub fn reference(mut self, name: &str, target_type: Option<&str>, multi: bool) -> Self {
        self = self.item_with(
            name,
            "t:ObjectReferenceType",
            0,
            if multi {
                MaxOccursSource::Keyword("unbounded".into())
            } else {
                MaxOccursSource::Count(1)
            },
            None,
        );
        if let Some(item) = self.ty.items.last_mut() {
            item.target_type = target_type.map(str::to_string);
        }
        self
    }

    pub fn item_with(
        mut self,
        name: &str,
        type_name: &str,
        min_occurs: u32,
        max_occurs: MaxOccursSource,
        matching_rule: Option<&str>,
    ) -> Self {
        self.ty.items.push(ItemSource {
            name: name.to_string(),
            type_name: type_name.to_string(),
            min_occurs,
            max_occurs,
            matching_rule: matching_rule.map(str::to_string),
            target_type: None,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_object_type_with_reference() {
        let src = SchemaSourceBuilder::new("urn:a")
            .complex_type("T", |t| t.object().reference("ownerRef", Some("c:UserType"), false))
            .element("t", "T")
            .build();
        let ty = &src.complex_types[0];
        assert!(ty.object);
        assert_eq!(ty.items[0].type_name, "t:ObjectReferenceType");
        assert_eq!(ty.items[0].target_type.as_deref(), Some("c:UserType"));
        assert_eq!(src.elements[0].name, "t");
    }

    #[test]
    fn simple_and_reference_types() {
        let src = SchemaSourceBuilder::new("urn:a")
            .simple_type("Code", PrimitiveType::String, Some("m:stringIgnoreCase"))
            .reference_type("Ref")
            .build();
        assert_eq!(src.simple_types.len(), 2);
        assert!(src.simple_types[1].reference);
    }
}
