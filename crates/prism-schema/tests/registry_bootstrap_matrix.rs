use std::sync::Arc;
use std::thread;

use prism_path::QName;
use prism_schema::constants::{COMMON_NS, MATCHING_NS, QUERY_NS, TYPES_NS};
use prism_schema::{
    Definition, ItemKind, Occurs, PrimitiveType, SchemaError, SchemaRegistry, SchemaSource,
    SchemaSourceBuilder,
};

fn c(local: &str) -> QName {
    QName::new(COMMON_NS, local)
}

#[test]
fn builtin_type_matrix() {
    let reg = SchemaRegistry::bootstrap(Vec::new()).unwrap();
    let cases: &[(&str, &str, bool)] = &[
        (TYPES_NS, "PolyStringType", false),
        (TYPES_NS, "ObjectReferenceType", false),
        (QUERY_NS, "QueryType", false),
        (COMMON_NS, "ObjectType", true),
        (COMMON_NS, "FocusType", true),
        (COMMON_NS, "UserType", true),
        (COMMON_NS, "RoleType", true),
        (COMMON_NS, "AssignmentType", false),
        (COMMON_NS, "ExtensionType", false),
    ];
    for (ns, local, object) in cases {
        let def = reg
            .find_type_definition(&QName::new(*ns, *local))
            .unwrap_or_else(|| panic!("missing {local}"));
        match def {
            Definition::Complex(ct) => assert_eq!(ct.object, *object, "{local}"),
            Definition::Simple(_) => assert!(!object, "{local}"),
        }
    }
}

#[test]
fn user_item_matrix() {
    let reg = SchemaRegistry::bootstrap(Vec::new()).unwrap();
    let snap = reg.snapshot();
    let user = snap.find_complex_type(&c("UserType")).unwrap();
    let cases: &[(&str, &str, bool)] = &[
        ("name", "property", true),
        ("description", "property", true),
        ("extension", "container", true),
        ("assignment", "container", false),
        ("linkRef", "reference", false),
        ("fullName", "property", true),
        ("emailAddress", "property", true),
        ("employeeType", "property", false),
    ];
    for (local, kind, single) in cases {
        let item = user
            .find_item(&QName::local(*local))
            .unwrap_or_else(|| panic!("missing {local}"));
        assert_eq!(item.kind.label(), *kind, "{local}");
        assert_eq!(item.is_single_valued(), *single, "{local}");
    }
    let email = user.find_item(&QName::local("emailAddress")).unwrap();
    assert_eq!(
        email.matching_rule,
        Some(QName::new(MATCHING_NS, "emailAddress"))
    );
    let link = user.find_item(&QName::local("linkRef")).unwrap();
    assert_eq!(
        link.kind,
        ItemKind::Reference {
            target_type: Some(c("ShadowType"))
        }
    );
    assert_eq!(link.max_occurs, Occurs::Unbounded);
}

#[test]
fn object_definition_by_element() {
    let reg = SchemaRegistry::bootstrap(Vec::new()).unwrap();
    let snap = reg.snapshot();
    let (element, ty) = snap
        .find_object_definition_by_element(&QName::local("role"))
        .unwrap();
    assert_eq!(element.name, c("role"));
    assert_eq!(ty.name, c("RoleType"));
    assert!(snap
        .find_object_definition_by_element(&QName::new(QUERY_NS, "query"))
        .is_none());
    assert_eq!(snap.element_for_type(&c("UserType")).unwrap().name, c("user"));
}

#[test]
fn extension_source_from_json() {
    let ext = SchemaSource::from_json(
        r#"{
            "namespace": "urn:example:pirates",
            "prefixes": { "pir": "urn:example:pirates" },
            "simpleTypes": [
                { "name": "ShipNameType", "primitive": "string", "matchingRule": "m:stringIgnoreCase" }
            ],
            "complexTypes": [{
                "name": "PirateExtensionType",
                "extensionOf": "c:UserType",
                "items": [
                    { "name": "ship", "type": "pir:ShipNameType" },
                    { "name": "weapon", "type": "xsd:string", "maxOccurs": "unbounded" },
                    { "name": "loot", "type": "xsd:int" }
                ]
            }]
        }"#,
    )
    .unwrap();
    let reg = SchemaRegistry::bootstrap(vec![ext]).unwrap();
    let snap = reg.snapshot();
    assert_eq!(snap.namespaces().last().unwrap(), "urn:example:pirates");

    let user = snap.find_complex_type(&c("UserType")).unwrap();
    let ext_item = user.find_item(&QName::local("extension")).unwrap();
    let ext_def = snap.container_type_for(user, ext_item).unwrap();
    let ship = ext_def.find_item(&QName::local("ship")).unwrap();
    assert_eq!(ship.primitive(), Some(PrimitiveType::String));
    assert_eq!(
        ship.matching_rule,
        Some(QName::new(MATCHING_NS, "stringIgnoreCase"))
    );
    let loot = ext_def.find_item(&QName::local("loot")).unwrap();
    assert_eq!(loot.primitive(), Some(PrimitiveType::Integer));
}

#[test]
fn two_extensions_of_one_type_merge() {
    let a = SchemaSourceBuilder::new("urn:a")
        .complex_type("AExt", |t| t.extension_of("c:UserType").item("a", "xsd:string"))
        .build();
    let b = SchemaSourceBuilder::new("urn:b")
        .complex_type("BExt", |t| t.extension_of("c:UserType").item("b", "xsd:string"))
        .build();
    let reg = SchemaRegistry::bootstrap(vec![a, b]).unwrap();
    let snap = reg.snapshot();
    let user = snap.find_complex_type(&c("UserType")).unwrap();
    let ext = snap.extension_definition(user).unwrap();
    let names: Vec<_> = ext.items.iter().map(|i| i.name.to_string()).collect();
    assert_eq!(names, vec!["{urn:a}a", "{urn:b}b"]);
}

#[test]
fn failed_bootstrap_reports_error() {
    let bad = SchemaSourceBuilder::new("urn:bad")
        .complex_type("X", |t| t.item("v", "nope:Type"))
        .build();
    let err = SchemaRegistry::bootstrap(vec![bad]).unwrap_err();
    assert!(matches!(err, SchemaError::Name(_)));
}

#[test]
fn concurrent_reads_during_registration() {
    let reg = Arc::new(SchemaRegistry::bootstrap(Vec::new()).unwrap());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snap = reg.snapshot();
                    let user = snap.find_complex_type(&c("UserType")).unwrap();
                    assert!(user.find_item(&QName::local("name")).is_some());
                    assert!(snap.type_count() >= 18);
                }
            })
        })
        .collect();
    for i in 0..20 {
        let src = SchemaSourceBuilder::new(format!("urn:late:{i}"))
            .complex_type("LateType", |t| t.item("v", "xsd:string"))
            .build();
        reg.register(&src).unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert!(reg
        .find_type_definition(&QName::new("urn:late:19", "LateType"))
        .is_some());
}
