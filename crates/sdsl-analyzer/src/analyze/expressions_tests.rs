use crate::ast::{
    BinaryOp, Classification, ExprKind, ObjectKind, Qualifiers, ScalarKind, StreamsKind, TypeRef,
};
use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{Fixture, span, variable_refs};

const FLOAT: TypeRef = TypeRef::Scalar(ScalarKind::Float);
const FLOAT4: TypeRef = TypeRef::Vector(ScalarKind::Float, 4);

#[test]
fn stream_variables_need_streams_prefix() {
    let mut f = Fixture::new();
    let shader = f.class("Transform", &[]);
    let position = f.var_with(shader, "Position", FLOAT4, Qualifiers::STREAM);

    let bare = f.ident_stmt("Position");
    let method = f.new_method("Bare", TypeRef::Void).with_body(vec![bare]);
    f.define(shader, method);

    let target = f.ident("streams");
    let access = f.member(target, "Position");
    let prefixed = f.expr_stmt(access);
    let method = f.new_method("Prefixed", TypeRef::Void).with_body(vec![prefixed]);
    let prefixed = f.define(shader, method);

    let (record, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..0: stream variable `Position` must be accessed through `streams` (hint: write `streams.<name>`)"
    );
    assert_eq!(variable_refs(record.pools().class(), position), 2);

    let access = f.expr_at(prefixed, 0);
    assert_eq!(access.inference.declaration, Some(position));
    assert_eq!(access.inference.target_type, Some(FLOAT4));
    assert_eq!(access.classification, Some(Classification::Class));
}

#[test]
fn streams_prefix_on_plain_or_unknown_member() {
    let mut f = Fixture::new();
    let shader = f.class("Transform", &[]);
    f.var(shader, "Color", FLOAT4);

    let target = f.ident("streams");
    let plain = f.member(target, "Color").with_span(span(0, 13));
    let plain = f.expr_stmt(plain);
    let target = f.ident("streams");
    let unknown = f.member(target, "Nope").with_span(span(20, 32));
    let unknown = f.expr_stmt(unknown);
    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_body(vec![plain, unknown]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(diagnostics.printer().render(), @r"
    error at 0..13: `Color` is not a stream variable (hint: remove the `streams.` prefix)
    error at 20..32: stream `Nope` is not defined
    ");
}

#[test]
fn read_only_stream_write() {
    let mut f = Fixture::new();
    let shader = f.class("Transform", &[]);
    f.var_with(shader, "Position", FLOAT4, Qualifiers::STREAM);

    let input = f.local("input", TypeRef::Streams(StreamsKind::Input));
    let target = f.ident("input");
    let target = f.member(target, "Position");
    let value = f.float(1.0);
    let write = f.assign(target, value);
    let write = f.expr_stmt(write);

    let target = f.ident("input");
    let read = f.member(target, "Position");
    let read = f.expr_stmt(read);

    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_parameters(vec![input])
        .with_body(vec![write, read]);
    f.define(shader, method);

    let (record, diagnostics) = f.analyze(shader);

    assert_eq!(diagnostics.count(DiagnosticKind::ReadOnlyStreamWrite), 1);
    assert_eq!(diagnostics.len(), 1);
    assert!(record.navigable().iter().any(|n| n.declaration == input));
}

#[test]
fn nested_assignment() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let a = f.local("a", FLOAT);
    let b = f.local("b", FLOAT);
    let declare = f.declare(vec![a, b]);

    let inner_target = f.ident("b");
    let one = f.float(1.0);
    let inner = f.assign(inner_target, one).with_span(span(4, 9));
    let outer_target = f.ident("a");
    let outer = f.assign(outer_target, inner).with_span(span(0, 9));
    let stmt = f.expr_stmt(outer);

    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_body(vec![declare, stmt]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(diagnostics.printer().render(), @"error at 4..9: nested assignment");
}

#[test]
fn stage_outside_initializer() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let stage = f.ident("stage").with_span(span(2, 7));
    let stmt = f.expr_stmt(stage);
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 2..7: `stage` outside a composition initializer (hint: use `stage` only as `extern T x = stage;`)"
    );
}

#[test]
fn static_method_cannot_reach_inherited_instance_state() {
    let mut f = Fixture::new();
    let base = f.class("Base", &[]);
    let instance = f.var(base, "Instance", FLOAT);
    let shared = f.var_with(base, "Shared", FLOAT, Qualifiers::STATIC);
    let derived = f.class("Derived", &[base]);
    let own = f.var(derived, "Own", FLOAT);

    let uses = vec![
        f.ident_stmt("Instance"),
        f.ident_stmt("Shared"),
        f.ident_stmt("Own"),
    ];
    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_qualifiers(Qualifiers::STATIC)
        .with_body(uses);
    f.define(derived, method);

    let (record, diagnostics) = f.analyze(derived);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..0: static method cannot reference instance variable `Instance`"
    );
    let pools = record.pools();
    assert_eq!(variable_refs(pools.class(), instance), 1);
    assert_eq!(variable_refs(pools.static_refs(), shared), 1);
    assert_eq!(variable_refs(pools.class(), shared), 0);
    assert_eq!(variable_refs(pools.class(), own), 1);
}

#[test]
fn diamond_variable_is_ambiguous() {
    let mut f = Fixture::new();
    let left = f.class("Left", &[]);
    f.var(left, "x", FLOAT);
    let right = f.class("Right", &[]);
    f.var(right, "x", FLOAT);
    let join = f.class("Join", &[left, right]);
    let stmt = f.ident_stmt("x");
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..0: `x` is declared by several mixins in the hierarchy (related: declared in `Right` at 0..0) (related: declared in `Left` at 0..0) (hint: redeclare or override the member in this mixin to pick one)"
    );
}

#[test]
fn local_redeclaration_resolves_diamond() {
    let mut f = Fixture::new();
    let left = f.class("Left", &[]);
    f.var(left, "x", FLOAT);
    let right = f.class("Right", &[]);
    f.var(right, "x", FLOAT);
    let join = f.class("Join", &[left, right]);
    let own = f.var(join, "x", FLOAT);
    let stmt = f.ident_stmt("x");
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    let compute = f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    assert!(diagnostics.is_empty());
    assert_eq!(f.expr_at(compute, 0).inference.declaration, Some(own));
}

#[test]
fn locals_shadow_members() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "value", FLOAT);
    let local = f.local("value", FLOAT4);
    let declare = f.declare(vec![local]);
    let stmt = f.ident_stmt("value");
    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_body(vec![declare, stmt]);
    let compute = f.define(shader, method);

    let (record, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    let expr = f.expr_at(compute, 1);
    assert_eq!(expr.inference.declaration, Some(local));
    assert_eq!(expr.classification, None);
    assert_eq!(record.pools().occurrence_count(), 0);
}

#[test]
fn swizzles_and_matrix_components() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "v", FLOAT4);
    f.var(shader, "m", TypeRef::Matrix(ScalarKind::Float, 4, 4));

    let mut body = Vec::new();
    for (target, member) in [("v", "xy"), ("v", "b"), ("m", "_m01"), ("m", "_11_22")] {
        let target = f.ident(target);
        let access = f.member(target, member);
        body.push(f.expr_stmt(access));
    }
    let method = f.new_method("Compute", TypeRef::Void).with_body(body);
    let compute = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    let types: Vec<_> = (0..4)
        .map(|i| f.expr_at(compute, i).inference.target_type.clone())
        .collect();
    assert_eq!(
        types,
        [
            Some(TypeRef::Vector(ScalarKind::Float, 2)),
            Some(FLOAT),
            Some(FLOAT),
            Some(TypeRef::Vector(ScalarKind::Float, 2)),
        ]
    );
}

#[test]
fn unknown_swizzle_is_a_warning() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "v", FLOAT4);
    let target = f.ident("v");
    let access = f.member(target, "q").with_span(span(0, 3));
    let stmt = f.expr_stmt(access);
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert!(!diagnostics.has_errors());
    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"warning at 0..3: cannot infer the type of member `q`"
    );
}

#[test]
fn binary_operator_types() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "v", FLOAT4);

    let cases = [BinaryOp::Mul, BinaryOp::Less];
    let mut body = Vec::new();
    for op in cases {
        let left = f.ident("v");
        let right = f.float(2.0);
        let expr = f.binary(op, left, right);
        body.push(f.expr_stmt(expr));
    }
    let left = f.int(1);
    let right = f.float(2.0);
    let mixed = f.binary(BinaryOp::Add, left, right);
    body.push(f.expr_stmt(mixed));

    let method = f.new_method("Compute", TypeRef::Void).with_body(body);
    let compute = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    let types: Vec<_> = (0..3)
        .map(|i| f.expr_at(compute, i).inference.target_type.clone())
        .collect();
    assert_eq!(
        types,
        [
            Some(FLOAT4),
            Some(TypeRef::Vector(ScalarKind::Bool, 4)),
            Some(FLOAT),
        ]
    );
}

#[test]
fn indexer_types() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "weights", TypeRef::array(FLOAT, 4));
    f.var(shader, "m", TypeRef::Matrix(ScalarKind::Float, 3, 4));

    let mut body = Vec::new();
    for name in ["weights", "m"] {
        let target = f.ident(name);
        let index = f.int(1);
        let expr = f.index(target, index);
        body.push(f.expr_stmt(expr));
    }
    let method = f.new_method("Compute", TypeRef::Void).with_body(body);
    let compute = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    assert_eq!(f.expr_at(compute, 0).inference.target_type, Some(FLOAT));
    assert_eq!(
        f.expr_at(compute, 1).inference.target_type,
        Some(TypeRef::Vector(ScalarKind::Float, 4))
    );
}

#[test]
fn undefined_variable() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let missing = f.ident("missing").with_span(span(3, 10));
    let stmt = f.expr_stmt(missing);
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    let compute = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(diagnostics.printer().render(), @"error at 3..10: `missing` is not defined");
    assert!(f.expr_at(compute, 0).inference.unresolved);
}

#[test]
fn sampler_state_names_are_not_undefined() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let target = f.ident("Filter");
    let value = f.ident("MIN_MAG_MIP_LINEAR");
    let state = f.assign(target, value);
    let init = f.initializer(vec![state]);
    let sampler = f.var(
        shader,
        "LinearSampler",
        TypeRef::Object(ObjectKind::SamplerState),
    );
    f.variable_mut(sampler).unwrap().initial_value = Some(init);

    let (_, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
}

#[test]
fn composition_members_are_classified() {
    let mut f = Fixture::new();
    let comp = f.class("Tinting", &[]);
    let tint = f.var(comp, "Tint", FLOAT4);
    let main = f.class("Main", &[]);
    let ty = f.type_name("Tinting");
    let extern_var = f.var_with(main, "tinting", ty, Qualifiers::EXTERN);
    let ty = f.type_name("Tinting");
    let stage = f.ident("stage");
    let staged = f.var_with(main, "shared", ty, Qualifiers::EXTERN);
    f.variable_mut(staged).unwrap().initial_value = Some(stage);

    let mut body = Vec::new();
    for (target, member) in [("tinting", "Tint"), ("shared", "Tint"), ("tinting", "Missing")] {
        let target = f.ident(target);
        let access = f.member(target, member);
        body.push(f.expr_stmt(access));
    }
    let method = f.new_method("Compute", TypeRef::Void).with_body(body);
    let compute = f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..0: composition has no member `Missing`"
    );
    let pools = record.pools();
    assert_eq!(variable_refs(pools.extern_refs(), tint), 1);
    assert_eq!(variable_refs(pools.stage_init(), tint), 1);
    assert_eq!(variable_refs(pools.class(), extern_var), 2);
    assert_eq!(variable_refs(pools.class(), staged), 1);
    assert_eq!(pools.occurrence_count(), 5);

    let access = f.expr_at(compute, 0);
    assert_eq!(access.classification, Some(Classification::Extern));
    let ExprKind::Member(node) = &access.kind else {
        panic!("expected a member access");
    };
    assert_eq!(node.target.inference.target_type, Some(TypeRef::Shader(comp)));
}

#[test]
fn composition_array_indexed_with_variable() {
    let mut f = Fixture::new();
    let comp = f.class("Layer", &[]);
    f.var(comp, "Weight", FLOAT);
    let main = f.class("Main", &[]);
    let ty = f.type_name("Layer");
    f.var_with(main, "layers", TypeRef::array(ty, 2), Qualifiers::EXTERN);
    let i = f.local("i", TypeRef::Scalar(ScalarKind::Int));
    let declare = f.declare(vec![i]);

    let target = f.ident("layers");
    let index = f.ident("i").with_span(span(7, 8));
    let element = f.index(target, index);
    let access = f.member(element, "Weight");
    let stmt = f.expr_stmt(access);

    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_body(vec![declare, stmt]);
    f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 7..8: composition array indexed with a non-literal"
    );
    assert_eq!(record.pools().extern_refs().occurrence_count(), 1);
}

#[test]
fn composition_stream_member_needs_streams() {
    let mut f = Fixture::new();
    let comp = f.class("Tinting", &[]);
    let pos = f.var_with(comp, "Pos", FLOAT4, Qualifiers::STREAM);
    let main = f.class("Main", &[]);
    let ty = f.type_name("Tinting");
    f.var_with(main, "tinting", ty, Qualifiers::EXTERN);

    let target = f.ident("tinting");
    let access = f.member(target, "Pos").with_span(span(0, 11));
    let stmt = f.expr_stmt(access);
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    let compute = f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..11: stream variable `Pos` must be accessed through `streams` (hint: write `streams.<name>`)"
    );
    assert_eq!(variable_refs(record.pools().extern_refs(), pos), 1);
    assert_eq!(f.expr_at(compute, 0).inference.declaration, Some(pos));
}

#[test]
fn composition_does_not_expose_ancestor_names() {
    let mut f = Fixture::new();
    let inner = f.class("Inner", &[]);
    f.var(inner, "Level", FLOAT);
    let outer = f.class("Outer", &[inner]);
    let main = f.class("Main", &[]);
    let ty = f.type_name("Outer");
    f.var_with(main, "outer", ty, Qualifiers::EXTERN);

    let mut body = Vec::new();
    for (member, at) in [("Inner", span(0, 11)), ("Level", span(20, 31))] {
        let target = f.ident("outer");
        let access = f.member(target, member).with_span(at);
        body.push(f.expr_stmt(access));
    }
    let method = f.new_method("Compute", TypeRef::Void).with_body(body);
    f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..11: composition has no member `Inner`"
    );
    assert_eq!(record.pools().extern_refs().occurrence_count(), 1);
}

#[test]
fn static_classes_lists_foreign_shaders_only() {
    let mut f = Fixture::new();
    let util = f.class("Util", &[]);
    let scale = f.var_with(util, "Scale", FLOAT, Qualifiers::STATIC);
    let main = f.class("Main", &[]);
    let count = f.var_with(main, "Count", FLOAT, Qualifiers::STATIC);

    let target = f.ident("Util");
    let access = f.member(target, "Scale");
    let foreign = f.expr_stmt(access);
    let own = f.ident_stmt("Count");
    let method = f
        .new_method("Compute", TypeRef::Void)
        .with_qualifiers(Qualifiers::STATIC)
        .with_body(vec![foreign, own]);
    f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    assert!(diagnostics.is_empty());
    let pools = record.pools();
    assert_eq!(variable_refs(pools.static_refs(), scale), 1);
    assert_eq!(variable_refs(pools.static_refs(), count), 1);
    let classes: Vec<_> = record.static_classes().iter().copied().collect();
    assert_eq!(classes, [f.module_id(util)]);
}

#[test]
fn bare_method_name_is_undefined() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let helper = f.new_method("Helper", TypeRef::Void).with_body(Vec::new());
    f.define(shader, helper);
    let read = f.ident("Helper").with_span(span(0, 6));
    let stmt = f.expr_stmt(read);
    let method = f.new_method("Compute", TypeRef::Void).with_body(vec![stmt]);
    let compute = f.define(shader, method);

    let (record, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..6: `Helper` is not defined"
    );
    let read = f.expr_at(compute, 0);
    assert!(read.inference.unresolved);
    assert_eq!(read.inference.declaration, None);
    assert_eq!(record.pools().occurrence_count(), 0);
}
