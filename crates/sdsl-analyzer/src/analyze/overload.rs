//! Overload selection by argument conversion cost.

use crate::ast::{Ast, DeclId, StreamsKind, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    Found(DeclId),
    /// No method of that name is visible.
    NoCandidates,
    /// Methods exist but none accepts the arguments.
    NoMatch,
}

/// Pick the cheapest candidate for `arguments`.
///
/// Candidates are expected innermost first; among equal signatures the first
/// one is kept, and ties in cost keep the earlier candidate. An argument of
/// unknown type disables scoring: the first candidate of compatible arity wins.
pub(crate) fn select(ast: &Ast, candidates: &[DeclId], arguments: &[Option<TypeRef>]) -> Selection {
    let mut unique: Vec<DeclId> = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        if ast.method(candidate).is_none() {
            continue;
        }
        if !unique.iter().any(|&u| same_signature(ast, u, candidate)) {
            unique.push(candidate);
        }
    }
    if unique.is_empty() {
        return Selection::NoCandidates;
    }

    let arity_ok: Vec<DeclId> = unique
        .into_iter()
        .filter(|&m| arity_accepts(ast, m, arguments.len()))
        .collect();

    let Some(arguments) = arguments.iter().map(Option::as_ref).collect::<Option<Vec<_>>>() else {
        return arity_ok
            .first()
            .map_or(Selection::NoMatch, |&m| Selection::Found(m));
    };

    let mut best: Option<(DeclId, u32)> = None;
    for candidate in arity_ok {
        let Some(cost) = signature_cost(ast, candidate, &arguments) else {
            continue;
        };
        if best.is_none_or(|(_, lowest)| cost < lowest) {
            best = Some((candidate, cost));
        }
    }
    best.map_or(Selection::NoMatch, |(m, _)| Selection::Found(m))
}

fn parameter_types(ast: &Ast, method: DeclId) -> Vec<TypeRef> {
    ast.method(method)
        .map(|m| {
            m.parameters
                .iter()
                .filter_map(|&p| ast.variable(p))
                .map(|p| p.ty.resolve(ast))
                .collect()
        })
        .unwrap_or_default()
}

/// Same parameter count and types.
pub(crate) fn same_signature(ast: &Ast, a: DeclId, b: DeclId) -> bool {
    a == b || parameter_types(ast, a) == parameter_types(ast, b)
}

/// `count` arguments fit, with trailing parameters covered by defaults.
fn arity_accepts(ast: &Ast, method: DeclId, count: usize) -> bool {
    let Some(method) = ast.method(method) else {
        return false;
    };
    if count > method.parameters.len() {
        return false;
    }
    method.parameters[count..]
        .iter()
        .all(|&p| ast.variable(p).is_some_and(|v| v.initial_value.is_some()))
}

fn signature_cost(ast: &Ast, method: DeclId, arguments: &[&TypeRef]) -> Option<u32> {
    let parameters = parameter_types(ast, method);
    arguments
        .iter()
        .zip(&parameters)
        .map(|(argument, parameter)| argument_cost(&argument.resolve(ast), parameter))
        .sum()
}

/// Conversion cost from `argument` to `parameter`; `None` when incompatible.
pub(crate) fn argument_cost(argument: &TypeRef, parameter: &TypeRef) -> Option<u32> {
    match (argument.streams_kind(), parameter.streams_kind()) {
        (Some(a), Some(p)) => {
            return (a == p || (a == StreamsKind::Streams && p == StreamsKind::Output))
                .then_some(0);
        }
        (Some(_), None) | (None, Some(_)) => return None,
        (None, None) => {}
    }

    if argument == parameter {
        return Some(0);
    }

    if let (Some(ak), Some(pk)) = (argument.scalar_kind(), parameter.scalar_kind()) {
        let mut cost = 0;
        if ak != pk {
            cost += 1;
            if ak.is_float() && !pk.is_float() {
                cost += 7;
            }
            if !ak.is_unsigned() && pk.is_unsigned() {
                cost += 2;
            }
        }
        return Some(cost + shape_cost(argument.shape()?, parameter.shape()?)?);
    }

    (argument.is_object_like() && parameter.is_object_like()).then_some(0)
}

fn shape_cost(argument: (u8, u8), parameter: (u8, u8)) -> Option<u32> {
    let components = |(r, c): (u8, u8)| u32::from(r) * u32::from(c);
    if argument == parameter {
        return Some(1);
    }
    if argument == (parameter.1, parameter.0) {
        return Some(1);
    }
    if argument == (1, 1) {
        return Some(10);
    }
    let (have, want) = (components(argument), components(parameter));
    (have > want).then(|| 100 * (have - want))
}
