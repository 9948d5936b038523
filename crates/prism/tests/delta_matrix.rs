use prism::codec::JsonCodec;
use prism::config::{DiffMode, PrismConfig};
use prism::delta::{diff, summarize, DeltaBuilder, DeltaCodec, ItemDelta, ObjectDelta};
use prism::model::{ContainerValue, PrismObject, PrismValue, ReferenceValue};
use prism::{PrismContext, PrismError};
use prism_path::{ItemPath, QName};
use prism_util::Fuzzer;
use proptest::prelude::*;

fn ctx() -> PrismContext {
    PrismContext::with_defaults().expect("built-in schemas")
}

fn path(text: &str) -> ItemPath {
    text.parse().expect("path")
}

/// A user assembled from generated parts.
#[derive(Debug, Clone)]
struct UserShape {
    description: Option<String>,
    employee_types: Vec<String>,
    links: Vec<String>,
    assignments: Vec<(u64, Option<String>, Option<i64>)>,
    status: Option<String>,
}

impl UserShape {
    fn build(&self, ctx: &PrismContext) -> PrismObject {
        let mut user = PrismObject::instantiate(&ctx.snapshot(), &QName::local("user"))
            .unwrap()
            .with_oid("u1");
        let mut set = |p: &str, values: Vec<PrismValue>| {
            user.set_item_values(ctx, &path(p), values).unwrap();
        };
        set("name", vec![ctx.poly_string("jack").into()]);
        if let Some(d) = &self.description {
            set("description", vec![d.as_str().into()]);
        }
        set(
            "employeeType",
            self.employee_types.iter().map(|t| t.as_str().into()).collect(),
        );
        set(
            "linkRef",
            self.links.iter().map(|l| ReferenceValue::new(l.clone()).into()).collect(),
        );
        if let Some(s) = &self.status {
            set("activation/administrativeStatus", vec![s.as_str().into()]);
        }
        for (id, description, order) in &self.assignments {
            if let Some(d) = description {
                set(&format!("assignment/{id}/description"), vec![d.as_str().into()]);
            }
            if let Some(o) = order {
                set(&format!("assignment/{id}/order"), vec![(*o).into()]);
            }
        }
        user
    }
}

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["pirate", "Pirate", "captain", "cook", "ADMIRAL", "admiral"])
        .prop_map(str::to_string)
}

fn user_shape() -> impl Strategy<Value = UserShape> {
    (
        prop::option::of(word()),
        prop::collection::vec(word(), 0..4),
        prop::collection::vec(prop::sample::select(vec!["s1", "s2", "s3"]).prop_map(str::to_string), 0..3),
        prop::collection::btree_map(
            1u64..5,
            (prop::option::of(word()), prop::option::of(0i64..3)),
            0..3,
        ),
        prop::option::of(prop::sample::select(vec!["enabled", "ENABLED", "disabled"]).prop_map(str::to_string)),
    )
        .prop_map(|(description, employee_types, mut links, assignments, status)| {
            links.dedup();
            UserShape {
                description,
                employee_types,
                links,
                assignments: assignments
                    .into_iter()
                    .filter(|(_, (d, o))| d.is_some() || o.is_some())
                    .map(|(id, (d, o))| (id, d, o))
                    .collect(),
                status,
            }
        })
}

proptest! {
    #[test]
    fn diff_then_apply_reaches_target(a in user_shape(), b in user_shape()) {
        let ctx = ctx();
        let (a, b) = (a.build(&ctx), b.build(&ctx));
        let delta = diff(&ctx, &a, &b).unwrap();
        let mut patched = a.clone();
        delta.apply_to(&ctx, &mut patched).unwrap();
        prop_assert!(patched.equivalent(&b, &ctx), "{:#?}", delta);
        prop_assert!(diff(&ctx, &b, &b).unwrap().is_empty());
    }

    #[test]
    fn replace_policy_reaches_target(a in user_shape(), b in user_shape()) {
        let mut config = PrismConfig::default();
        config.diff.multi_valued = DiffMode::Replace;
        config.diff.recurse_containers = false;
        let ctx = ctx().with_config(config);
        let (a, b) = (a.build(&ctx), b.build(&ctx));
        let delta = diff(&ctx, &a, &b).unwrap();
        prop_assert!(delta.modifications().iter().all(ItemDelta::is_replace));
        let mut patched = a.clone();
        delta.apply_to(&ctx, &mut patched).unwrap();
        prop_assert!(patched.equivalent(&b, &ctx));
    }

    #[test]
    fn delta_documents_survive_json(a in user_shape(), b in user_shape()) {
        let ctx = ctx();
        let (a, b) = (a.build(&ctx), b.build(&ctx));
        let delta = diff(&ctx, &a, &b).unwrap();
        let json = JsonCodec::from_context(&ctx);
        let codec = DeltaCodec::new(&ctx);
        let text = json.write_document(&codec.encode(&delta).unwrap()).unwrap();
        let decoded = codec.decode(&json.read_document(&text).unwrap()).unwrap();
        let mut patched = a.clone();
        decoded.apply_to(&ctx, &mut patched).unwrap();
        prop_assert!(patched.equivalent(&b, &ctx));
    }
}

/// A random modify delta over a handful of items.
fn random_delta(f: &mut Fuzzer, type_name: &QName) -> ObjectDelta {
    let words = ["pirate", "PIRATE", "captain", "cook"];
    let mut builder = DeltaBuilder::modify("u1", type_name.clone());
    for _ in 0..f.int(1, 3) {
        let value = *f.pick(&words);
        builder = match f.int(0, 5) {
            0 => builder.add(path("employeeType"), [value]),
            1 => builder.delete(path("employeeType"), [value]),
            2 => builder.replace(path("employeeType"), f.subset(&words)),
            3 => builder.replace(path("description"), [value]),
            4 => {
                let id = f.int(1, 2);
                builder.replace(path(&format!("assignment/{id}/description")), [value])
            }
            _ => {
                let id = f.int(1, 2) as u64;
                builder.delete(path("assignment"), [ContainerValue::with_id(Some(id))])
            }
        };
    }
    builder.build()
}

#[test]
fn summarize_matches_sequential_application_fuzz() {
    let ctx = ctx();
    let base = UserShape {
        description: None,
        employee_types: vec!["cook".into()],
        links: vec![],
        assignments: vec![(1, Some("crew".into()), None)],
        status: None,
    }
    .build(&ctx);
    let mut compared = 0;
    for seed in 0..300 {
        let mut f = Fuzzer::from_u64(seed);
        let count = f.int(1, 4) as usize;
        let deltas = f.repeat(count, |f| random_delta(f, base.type_name()));

        let mut sequential = base.clone();
        if deltas.iter().try_for_each(|d| d.apply_to(&ctx, &mut sequential)).is_err() {
            continue;
        }
        let merged = summarize(&ctx, &deltas).unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        let mut summarized = base.clone();
        merged
            .apply_to(&ctx, &mut summarized)
            .unwrap_or_else(|e| panic!("seed {seed}: {e}\n{merged:#?}"));
        assert!(
            summarized.equivalent(&sequential, &ctx),
            "seed {seed}: {deltas:#?}\n{merged:#?}"
        );
        compared += 1;
    }
    assert!(compared > 100, "only {compared} sequences compared");
}

#[test]
fn apply_error_matrix() {
    let ctx = ctx();
    let user = UserShape {
        description: Some("x".into()),
        employee_types: vec![],
        links: vec![],
        assignments: vec![],
        status: None,
    }
    .build(&ctx);
    let ty = user.type_name().clone();
    let cases: [(ObjectDelta, fn(&PrismError) -> bool); 5] = [
        (
            DeltaBuilder::modify("u1", ty.clone()).add(path("description"), ["y"]).build(),
            |e| matches!(e, PrismError::SchemaViolation { .. }),
        ),
        (
            DeltaBuilder::modify("u1", ty.clone()).add(path("shoeSize"), ["9"]).build(),
            |e| matches!(e, PrismError::SchemaViolation { .. }),
        ),
        (
            DeltaBuilder::modify("u1", ty.clone())
                .add(path("employeeType"), ["a"])
                .delete(path("employeeType"), ["A"])
                .build(),
            |e| matches!(e, PrismError::IllegalDeltaState { .. }),
        ),
        (
            DeltaBuilder::modify("u2", ty.clone()).replace(path("description"), ["y"]).build(),
            |e| matches!(e, PrismError::IllegalDeltaState { .. }),
        ),
        (
            DeltaBuilder::modify("u1", ty.clone()).add(path("assignment/1/order"), ["first"]).build(),
            |e| matches!(e, PrismError::TypeMismatch { .. }),
        ),
    ];
    for (delta, check) in cases {
        let mut target = user.clone();
        let err = delta.apply_to(&ctx, &mut target).unwrap_err();
        assert!(check(&err), "{err}");
        assert_eq!(target, user, "failed delta must not change the object");
    }
}

#[test]
fn object_lifecycle() {
    let ctx = ctx();
    let user = UserShape {
        description: None,
        employee_types: vec![],
        links: vec![],
        assignments: vec![],
        status: None,
    }
    .build(&ctx);
    let ty = user.type_name().clone();
    let mut slot = None;
    ObjectDelta::add(user.clone()).apply_to_slot(&ctx, &mut slot).unwrap();
    assert!(ObjectDelta::add(user.clone()).apply_to_slot(&ctx, &mut slot).is_err());
    DeltaBuilder::modify("u1", ty.clone())
        .replace(path("description"), ["captain"])
        .build()
        .apply_to_slot(&ctx, &mut slot)
        .unwrap();
    ObjectDelta::delete("u1", ty.clone()).apply_to_slot(&ctx, &mut slot).unwrap();
    assert!(slot.is_none());
    assert!(DeltaBuilder::modify("u1", ty).build().apply_to_slot(&ctx, &mut slot).is_err());
}

#[test]
fn delete_names_container_values_by_id() {
    let ctx = ctx();
    let user = UserShape {
        description: None,
        employee_types: vec![],
        links: vec![],
        assignments: vec![(1, Some("crew".into()), Some(2)), (2, Some("cook".into()), None)],
        status: None,
    }
    .build(&ctx);

    let mut target = user.clone();
    DeltaBuilder::for_object(&user)
        .delete(path("assignment"), [ContainerValue::with_id(Some(1))])
        .build()
        .apply_to(&ctx, &mut target)
        .unwrap();
    let remaining = target.find_item(&path("assignment")).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.container_values()[0].id(), Some(2));

    // Without an id the content has to match.
    let mut target = user.clone();
    DeltaBuilder::for_object(&user)
        .delete(path("assignment"), [ContainerValue::with_id(None)])
        .build()
        .apply_to(&ctx, &mut target)
        .unwrap();
    assert_eq!(target, user);
}
