use std::sync::Arc;

use prism::codec::JsonCodec;
use prism::config::PrismConfig;
use prism::model::{bind, unbind, PrismObject};
use prism::xnode::XNode;
use prism::{PrismContext, PrismError};
use prism_path::ItemPath;
use prism_util::clone;

fn ctx() -> PrismContext {
    PrismContext::with_defaults().expect("built-in schemas")
}

fn read(ctx: &PrismContext, text: &str) -> PrismObject {
    let json = JsonCodec::from_context(ctx);
    bind(ctx, &json.read_document(text).expect("json")).expect("bind")
}

#[test]
fn end_to_end_keeps_declared_order() {
    let ctx = ctx();
    let json = JsonCodec::from_context(&ctx).pretty(false);
    let input = r#"{"user": {"description": "pirate", "name": "jack", "version": "3", "oid": "u1"}}"#;
    let user = bind(&ctx, &json.read_document(input).unwrap()).unwrap();

    let text = json.write_document(&unbind(&ctx, &user).unwrap()).unwrap();
    let reparsed = json.read_document(&text).unwrap();
    let (element, body) = reparsed.as_root().unwrap();
    assert_eq!(element.local_part(), "user");
    let keys: Vec<&str> = body.as_map().unwrap().keys().map(|k| k.local_part()).collect();
    assert_eq!(keys, ["oid", "version", "name", "description"]);

    let again = bind(&ctx, &reparsed).unwrap();
    assert!(again.equivalent(&user, &ctx));
    assert_eq!(again.version(), Some("3"));
}

#[test]
fn object_roundtrip_matrix() {
    let ctx = ctx();
    let cases = [
        r#"{"user": {"oid": "u1", "name": "jack"}}"#,
        r#"{"user": {"oid": "u2", "name": {"orig": "Jäck Spärrow", "norm": "jack sparrow"},
            "employeeType": ["pirate", "captain"], "emailAddress": "jack@Black.Pearl"}}"#,
        r#"{"user": {"oid": "u3", "name": "will",
            "assignment": [
                {"id": 1, "description": "crew", "order": 2, "targetRef": {"oid": "r1", "type": "c:RoleType"}},
                {"id": 2, "activation": {"administrativeStatus": "enabled", "validFrom": "2024-01-01T00:00:00Z"}}
            ],
            "activation": {"administrativeStatus": "disabled"},
            "linkRef": ["s1", "s2"]}}"#,
        r#"{"role": {"oid": "r1", "name": "captain", "requestable": true, "riskLevel": 3}}"#,
        r#"{"user": {"oid": "u4", "name": "bill", "jpegPhoto": "aGVsbG8="}}"#,
    ];
    for text in cases {
        let object = read(&ctx, text);
        let again = bind(&ctx, &unbind(&ctx, &object).unwrap()).unwrap();
        assert!(again.equivalent(&object, &ctx), "{text}");
        assert_eq!(again, object, "{text}");
    }
}

#[test]
fn bind_error_matrix() {
    let ctx = ctx();
    let json = JsonCodec::from_context(&ctx);
    let cases: [(&str, &str, fn(&PrismError) -> bool); 5] = [
        (
            r#"{"user": {"name": "a", "shoeSize": 9}}"#,
            "shoeSize",
            |e| matches!(e, PrismError::SchemaViolation { .. }),
        ),
        (
            r#"{"user": {"name": ["a", "b"]}}"#,
            "name[1]",
            |e| matches!(e, PrismError::SchemaViolation { .. }),
        ),
        (
            r#"{"role": {"riskLevel": "high"}}"#,
            "riskLevel[0]",
            |e| matches!(e, PrismError::TypeMismatch { .. }),
        ),
        (
            r#"{"user": {"assignment": [{"id": "x"}]}}"#,
            "assignment[0]",
            |e| matches!(e, PrismError::TypeMismatch { .. }),
        ),
        (
            r#"{"ship": {"name": "pearl"}}"#,
            "",
            |e| matches!(e, PrismError::UnresolvedReference { .. }),
        ),
    ];
    for (text, path, check) in cases {
        let err = bind(&ctx, &json.read_document(text).unwrap()).unwrap_err();
        assert!(check(&err), "{text}: {err}");
        let trail = err.path().unwrap_or_default();
        assert!(trail.ends_with(path), "{text}: {trail}");
    }
}

#[test]
fn raw_passthrough_keeps_unknown_keys() {
    let mut config = PrismConfig::default();
    config.binding.raw_passthrough = true;
    let ctx = ctx().with_config(config);
    let user = read(&ctx, r#"{"user": {"name": "a", "shoeSize": {"eu": 44}}}"#);
    let item = user.find_item(&ItemPath::from_names(&["shoeSize"])).unwrap();
    assert!(item.definition().is_none());

    let node = unbind(&ctx, &user).unwrap();
    let (_, body) = node.as_root().unwrap();
    let keys: Vec<&str> = body.as_map().unwrap().keys().map(|k| k.local_part()).collect();
    assert_eq!(keys.last(), Some(&"shoeSize"));
    assert!(matches!(body.as_map().unwrap().get_local("shoeSize"), Some(XNode::Map(_))));
}

#[test]
fn clone_safety() {
    let ctx = ctx();
    let original = Arc::new(read(&ctx, r#"{"user": {"oid": "u1", "name": "jack"}}"#));
    let mut copy = clone(&original).unwrap();
    assert!(copy.equivalent(&original, &ctx));
    Arc::get_mut(&mut copy)
        .expect("clone of a mutable object must be uniquely owned")
        .set_item_values(&ctx, &ItemPath::from_names(&["description"]), vec!["changed".into()])
        .unwrap();
    assert!(!copy.equivalent(&original, &ctx));
    assert!(original
        .find_item(&ItemPath::from_names(&["description"]))
        .is_none());
}

#[test]
fn namespace_equal_keys_keep_every_value() {
    let ctx = ctx();
    let user = read(
        &ctx,
        r#"{"user": {"oid": "u1", "name": "jack", "employeeType": "a", "c:employeeType": ["b", "c"]}}"#,
    );
    let item = user.find_item(&ItemPath::from_names(&["employeeType"])).unwrap();
    assert_eq!(item.len(), 3);

    let err = bind(
        &ctx,
        &JsonCodec::from_context(&ctx)
            .read_document(r#"{"user": {"name": "jack", "c:name": "will"}}"#)
            .unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, PrismError::SchemaViolation { .. }), "{err}");
}
