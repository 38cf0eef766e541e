use crate::ast::{
    Classification, DeclId, ExprKind, Keyword, Name, ObjectKind, Qualifiers, ScalarKind, Stmt,
    TypeRef, VTableSlot,
};
use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{Fixture, method_refs, span};

const FLOAT: TypeRef = TypeRef::Scalar(ScalarKind::Float);

/// `void name() {}` in `shader`.
fn empty_method(f: &mut Fixture, shader: DeclId, name: &str, qualifiers: Qualifiers) -> DeclId {
    let method = f
        .new_method(name, TypeRef::Void)
        .with_qualifiers(qualifiers)
        .with_body(Vec::new());
    f.define(shader, method)
}

/// `receiver.name()` as a statement.
fn keyword_call(f: &mut Fixture, receiver: &str, name: &str) -> Stmt {
    let receiver = f.ident(receiver);
    let target = f.member(receiver, name);
    let call = f.call(target, Vec::new());
    f.expr_stmt(call)
}

#[test]
fn this_and_base_dispatch_through_three_levels() {
    let mut f = Fixture::new();
    let a = f.class("A", &[]);
    let a_m = empty_method(&mut f, a, "M", Qualifiers::NONE);
    let b = f.class("B", &[a]);
    let c = f.class("C", &[b]);
    let c_m = empty_method(&mut f, c, "M", Qualifiers::OVERRIDE);
    let this_call = keyword_call(&mut f, "this", "M");
    let base_call = keyword_call(&mut f, "base", "M");
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_body(vec![this_call, base_call]);
    let run = f.define(c, method);

    let (record, diagnostics) = f.analyze(c);

    assert!(diagnostics.is_empty());
    let slot = Some(VTableSlot { shader: a, index: 0 });

    let this_call = f.expr_at(run, 0);
    let ExprKind::Call(call) = &this_call.kind else {
        panic!("expected a call");
    };
    assert_eq!(this_call.inference.declaration, Some(c_m));
    assert!(matches!(call.target.kind, ExprKind::Variable(_)));
    assert_eq!(call.target.classification, Some(Classification::Class));
    assert_eq!(call.slot, slot);
    assert!(record.this_method_calls().contains(&this_call.id));

    let base_call = f.expr_at(run, 1);
    let ExprKind::Call(call) = &base_call.kind else {
        panic!("expected a call");
    };
    assert_eq!(base_call.inference.declaration, Some(a_m));
    assert_eq!(call.slot, slot);
    assert!(record.base_method_calls().contains(&base_call.id));
    assert!(!record.this_method_calls().contains(&base_call.id));

    assert_eq!(method_refs(record.pools().class(), c_m), 1);
    assert_eq!(method_refs(record.pools().class(), a_m), 1);
}

#[test]
fn base_call_picks_nearest_override() {
    let mut f = Fixture::new();
    let a = f.class("A", &[]);
    empty_method(&mut f, a, "M", Qualifiers::NONE);
    let b = f.class("B", &[a]);
    let b_m = empty_method(&mut f, b, "M", Qualifiers::OVERRIDE);
    let c = f.class("C", &[b]);
    let base_call = keyword_call(&mut f, "base", "M");
    let method = f
        .new_method("M", TypeRef::Void)
        .with_qualifiers(Qualifiers::OVERRIDE)
        .with_body(vec![base_call]);
    let c_m = f.define(c, method);

    let (_, diagnostics) = f.analyze(c);

    assert!(diagnostics.is_empty());
    assert_eq!(f.expr_at(c_m, 0).inference.declaration, Some(b_m));
}

#[test]
fn this_keyword_is_normalized_before_dispatch() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    empty_method(&mut f, shader, "Helper", Qualifiers::NONE);
    let call = keyword_call(&mut f, "this", "Helper");
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![call]);
    let run = f.define(shader, method);

    f.analyze(shader);

    // `this.Helper()` is rewritten to a plain `Helper()` call.
    let ExprKind::Call(call) = &f.expr_at(run, 0).kind else {
        panic!("expected a call");
    };
    let ExprKind::Variable(name) = &call.target.kind else {
        panic!("expected a bare identifier");
    };
    assert_ne!(*name, Name::Keyword(Keyword::This));
}

#[test]
fn impossible_base_and_virtual_calls() {
    let mut f = Fixture::new();
    let a = f.class("A", &[]);
    let b = f.class("B", &[a]);
    let base_call = keyword_call(&mut f, "base", "M");
    let this_call = keyword_call(&mut f, "this", "N");
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_body(vec![base_call, this_call]);
    f.define(b, method);

    let (_, diagnostics) = f.analyze(b);

    insta::assert_snapshot!(diagnostics.printer().render(), @r"
    error at 0..0: no base implementation of `M` in the inheritance chain
    error at 0..0: no method `N` in the virtual table
    ");
}

#[test]
fn recursive_call_is_rejected() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let target = f.ident("Loop");
    let call = f.call(target, Vec::new()).with_span(span(10, 16));
    let stmt = f.expr_stmt(call);
    let method = f
        .new_method("Loop", TypeRef::Void)
        .with_span(span(0, 4))
        .with_body(vec![stmt]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 10..16: method `Loop` calls itself (related: declared here at 0..4)"
    );
}

#[test]
fn static_method_cannot_call_inherited_instance_method() {
    let mut f = Fixture::new();
    let base = f.class("Base", &[]);
    empty_method(&mut f, base, "Instance", Qualifiers::NONE);
    let shared = empty_method(&mut f, base, "Shared", Qualifiers::STATIC);
    let derived = f.class("Derived", &[base]);

    let instance_call = f.call_named("Instance", Vec::new());
    let instance_call = f.expr_stmt(instance_call);
    let shared_call = f.call_named("Shared", Vec::new());
    let shared_call = f.expr_stmt(shared_call);
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_qualifiers(Qualifiers::STATIC)
        .with_body(vec![instance_call, shared_call]);
    f.define(derived, method);

    let (record, diagnostics) = f.analyze(derived);

    insta::assert_snapshot!(
        diagnostics.printer().render(),
        @"error at 0..0: static method cannot call instance method `Instance`"
    );
    assert_eq!(method_refs(record.pools().static_refs(), shared), 1);
}

#[test]
fn unresolved_calls() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let x = f.local("x", FLOAT);
    let take = f
        .new_method("Take", TypeRef::Void)
        .with_parameters(vec![x])
        .with_body(Vec::new());
    f.define(shader, take);

    let nope = f.call_named("Nope", Vec::new());
    let nope = f.expr_stmt(nope);
    let one = f.float(1.0);
    let two = f.float(2.0);
    let too_many = f.call_named("Take", vec![one, two]);
    let too_many = f.expr_stmt(too_many);
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_body(vec![nope, too_many]);
    f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    insta::assert_snapshot!(diagnostics.printer().render(), @r"
    error at 0..0: no method matches the call to `Nope`
    error at 0..0: no overload of `Take` accepts these arguments
    ");
}

#[test]
fn overload_prefers_exact_argument_type() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    let int_param = f.local("value", TypeRef::Scalar(ScalarKind::Int));
    let method = f
        .new_method("Pick", TypeRef::Scalar(ScalarKind::Int))
        .with_parameters(vec![int_param])
        .with_body(Vec::new());
    let pick_int = f.define(shader, method);
    let float_param = f.local("value", FLOAT);
    let method = f
        .new_method("Pick", FLOAT)
        .with_parameters(vec![float_param])
        .with_body(Vec::new());
    let pick_float = f.define(shader, method);

    let one = f.float(1.0);
    let float_call = f.call_named("Pick", vec![one]);
    let float_call = f.expr_stmt(float_call);
    let one = f.int(1);
    let int_call = f.call_named("Pick", vec![one]);
    let int_call = f.expr_stmt(int_call);
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_body(vec![float_call, int_call]);
    let run = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    let float_call = f.expr_at(run, 0);
    assert_eq!(float_call.inference.declaration, Some(pick_float));
    assert_eq!(float_call.inference.target_type, Some(FLOAT));
    assert_eq!(f.expr_at(run, 1).inference.declaration, Some(pick_int));
}

#[test]
fn builtin_calls_are_navigable_only() {
    let mut f = Fixture::new();
    let saturate = f.add_builtin_method("saturate", FLOAT, &[FLOAT]);
    let shader = f.class("Main", &[]);
    let one = f.float(1.0);
    let call = f.call_named("saturate", vec![one]);
    let stmt = f.expr_stmt(call);
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![stmt]);
    let run = f.define(shader, method);

    let (record, diagnostics) = f.analyze(shader);

    assert!(diagnostics.is_empty());
    let call = f.expr_at(run, 0);
    assert_eq!(call.inference.declaration, Some(saturate));
    assert!(record.this_method_calls().is_empty());
    assert!(record.navigable().iter().any(|n| n.declaration == saturate));
    assert_eq!(record.pools().occurrence_count(), 0);
}

#[test]
fn composition_method_call() {
    let mut f = Fixture::new();
    let comp = f.class("Shading", &[]);
    let method = f
        .new_method("Shade", TypeRef::Vector(ScalarKind::Float, 4))
        .with_body(Vec::new());
    let shade = f.define(comp, method);
    let main = f.class("Main", &[]);
    let ty = f.type_name("Shading");
    f.var_with(main, "shading", ty, Qualifiers::EXTERN);

    let receiver = f.ident("shading");
    let target = f.member(receiver, "Shade");
    let call = f.call(target, Vec::new());
    let stmt = f.expr_stmt(call);
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![stmt]);
    let run = f.define(main, method);

    let (record, diagnostics) = f.analyze(main);

    assert!(diagnostics.is_empty());
    let call = f.expr_at(run, 0);
    assert_eq!(call.inference.declaration, Some(shade));
    assert_eq!(
        call.inference.target_type,
        Some(TypeRef::Vector(ScalarKind::Float, 4))
    );
    assert!(record.this_method_calls().is_empty());
    assert_eq!(method_refs(record.pools().extern_refs(), shade), 1);
}

#[test]
fn diamond_method_is_ambiguous() {
    let mut f = Fixture::new();
    let left = f.class("Left", &[]);
    empty_method(&mut f, left, "M", Qualifiers::NONE);
    let right = f.class("Right", &[]);
    empty_method(&mut f, right, "M", Qualifiers::NONE);
    let join = f.class("Join", &[left, right]);
    let call = f.call_named("M", Vec::new());
    let stmt = f.expr_stmt(call);
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![stmt]);
    f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    assert_eq!(diagnostics.count(DiagnosticKind::MethodNameAmbiguity), 1);
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn stage_method_calls_are_tracked() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    empty_method(&mut f, shader, "Once", Qualifiers::STAGE);
    let call = f.call_named("Once", Vec::new());
    let stmt = f.expr_stmt(call);
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![stmt]);
    let run = f.define(shader, method);

    let (record, _) = f.analyze(shader);

    let call = f.expr_at(run, 0).id;
    assert!(record.this_method_calls().contains(&call));
    assert!(record.stage_method_calls().contains(&call));
}

#[test]
fn unknown_intrinsic_is_left_alone() {
    let mut f = Fixture::new();
    let shader = f.class("Main", &[]);
    f.var(shader, "tex", TypeRef::Object(ObjectKind::Texture2D));
    let known = keyword_call(&mut f, "tex", "Sample");
    let unknown = keyword_call(&mut f, "missing", "Sample");
    let method = f
        .new_method("Run", TypeRef::Void)
        .with_body(vec![known, unknown]);
    let run = f.define(shader, method);

    let (_, diagnostics) = f.analyze(shader);

    assert_eq!(diagnostics.count(DiagnosticKind::UndefinedVariable), 1);
    assert_eq!(diagnostics.len(), 1);
    let call = f.expr_at(run, 0);
    assert_eq!(call.inference.declaration, None);
    assert!(!call.inference.unresolved);
    assert!(f.expr_at(run, 1).inference.unresolved);
}

#[test]
fn this_call_in_diamond_is_ambiguous() {
    let mut f = Fixture::new();
    let left = f.class("Left", &[]);
    empty_method(&mut f, left, "M", Qualifiers::NONE);
    let right = f.class("Right", &[]);
    empty_method(&mut f, right, "M", Qualifiers::NONE);
    let join = f.class("Join", &[left, right]);
    let stmt = keyword_call(&mut f, "this", "M");
    let method = f.new_method("Run", TypeRef::Void).with_body(vec![stmt]);
    f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    assert_eq!(diagnostics.count(DiagnosticKind::MethodNameAmbiguity), 1);
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn base_call_in_diamond_is_ambiguous() {
    let mut f = Fixture::new();
    let left = f.class("Left", &[]);
    let left_m = empty_method(&mut f, left, "M", Qualifiers::NONE);
    let right = f.class("Right", &[]);
    empty_method(&mut f, right, "M", Qualifiers::NONE);
    let join = f.class("Join", &[left, right]);
    let stmt = keyword_call(&mut f, "base", "M");
    let method = f
        .new_method("M", TypeRef::Void)
        .with_qualifiers(Qualifiers::OVERRIDE)
        .with_body(vec![stmt]);
    let join_m = f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    assert_eq!(diagnostics.count(DiagnosticKind::MethodNameAmbiguity), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(f.expr_at(join_m, 0).inference.declaration, Some(left_m));
}

#[test]
fn base_call_through_shared_ancestor_is_not_ambiguous() {
    let mut f = Fixture::new();
    let root = f.class("Root", &[]);
    empty_method(&mut f, root, "M", Qualifiers::NONE);
    let left = f.class("Left", &[root]);
    let left_m = empty_method(&mut f, left, "M", Qualifiers::OVERRIDE);
    let right = f.class("Right", &[root]);
    let join = f.class("Join", &[left, right]);
    let stmt = keyword_call(&mut f, "base", "M");
    let method = f
        .new_method("M", TypeRef::Void)
        .with_qualifiers(Qualifiers::OVERRIDE)
        .with_body(vec![stmt]);
    let join_m = f.define(join, method);

    let (_, diagnostics) = f.analyze(join);

    assert!(diagnostics.is_empty());
    assert_eq!(f.expr_at(join_m, 0).inference.declaration, Some(left_m));
}
