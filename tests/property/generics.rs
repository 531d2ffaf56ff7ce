//! Property tests for generic instantiation and inference.
//!
//! Programs are assembled from random primitive types; each property states
//! what the checker must conclude for every such program.

use proptest::prelude::*;

use reef::ast::builder::{generic, named, ClassSpec, FunctionSpec, ProgramBuilder};
use reef::ast::ExprId;
use reef::typeck::generics::{CellOrigin, GenericCells};
use reef::typeck::types::{CellId, ClassId, Type};
use reef::{type_check, CheckedProgram, CheckerOptions, TypeError};

const PRIMITIVES: [&str; 3] = ["int", "string", "bool"];

fn arb_primitive() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PRIMITIVES.to_vec())
}

fn literal(b: &mut ProgramBuilder, ty: &str) -> ExprId {
    match ty {
        "int" => b.int(7),
        "string" => b.string("seven"),
        _ => b.bool(true),
    }
}

fn check(b: ProgramBuilder, options: &CheckerOptions) -> CheckedProgram {
    let program = b.finish();
    match type_check(&program, options) {
        Ok(checked) => checked,
        Err(e) => panic!("checker failed internally: {e}"),
    }
}

fn errors(checked: &CheckedProgram) -> Vec<TypeError> {
    checked.errors().iter().map(|d| d.error.clone()).collect()
}

/// `fn identity<T>(x: T): T { return x }`
fn identity(b: &mut ProgramBuilder) {
    let x = b.var("x");
    let ret = b.ret(Some(x));
    b.top_function(FunctionSpec::new("identity").type_param("T").param("x", named("T")).returns(named("T")).body(vec![ret]));
}

fn fresh_cells(count: usize) -> (GenericCells, Vec<CellId>) {
    let mut cells = GenericCells::new();
    let ids = (0..count).map(|i| cells.fresh(CellOrigin::InferredVariable { name: format!("c{i}") })).collect();
    (cells, ids)
}

/// Connected components of `links` over `count` nodes, computed naively.
fn component_of(count: usize, links: &[(usize, usize)], start: usize) -> Vec<bool> {
    let mut reached = vec![false; count];
    reached[start] = true;
    let mut changed = true;
    while changed {
        changed = false;
        for &(a, b) in links {
            if reached[a] != reached[b] {
                reached[a] = true;
                reached[b] = true;
                changed = true;
            }
        }
    }
    reached
}

proptest! {
    #[test]
    fn resolution_reaches_exactly_the_linked_cells(
        links in prop::collection::vec((0usize..12, 0usize..12), 0..16),
        target in 0usize..12,
        resolve_first in any::<bool>(),
    ) {
        let (mut cells, ids) = fresh_cells(12);
        let int = Type::class(ClassId(1));
        if resolve_first {
            cells.resolve(ids[target], int.clone());
        }
        for &(a, b) in &links {
            cells.link(ids[a], ids[b]);
        }
        if !resolve_first {
            cells.resolve(ids[target], int.clone());
        }

        let reached = component_of(12, &links, target);
        for (i, &cell) in ids.iter().enumerate() {
            if reached[i] {
                prop_assert_eq!(cells.resolved(cell), Some(&int));
            } else {
                prop_assert_eq!(cells.resolved(cell), None);
            }
        }
    }

    #[test]
    fn resolution_is_idempotent(
        links in prop::collection::vec((0usize..6, 0usize..6), 0..8),
        first in 0u32..4,
        second in 0u32..4,
    ) {
        let (mut cells, ids) = fresh_cells(6);
        for &(a, b) in &links {
            cells.link(ids[a], ids[b]);
        }
        cells.resolve(ids[0], Type::class(ClassId(first)));
        cells.resolve(ids[0], Type::class(ClassId(second)));
        for &(a, b) in &links {
            cells.link(ids[a], ids[b]);
        }
        prop_assert_eq!(cells.resolved(ids[0]), Some(&Type::class(ClassId(first))));
    }

    #[test]
    fn identity_returns_its_argument_type(arg in arb_primitive(), declared in arb_primitive()) {
        let mut b = ProgramBuilder::new();
        identity(&mut b);
        let value = literal(&mut b, arg);
        let call = b.call_named("identity", vec![value]);
        let declare = b.declaration("r", false, Some(named(declared)), Some(call));
        b.push(declare);
        let checked = check(b, &CheckerOptions::default());

        prop_assert_eq!(checked.display_type_of(call), Some(arg.to_string()));
        if arg == declared {
            prop_assert!(checked.is_ok(), "{:?}", checked.diagnostics);
        } else {
            let expected = vec![TypeError::MismatchedTypes { expected: declared.to_string(), found: arg.to_string() }];
            prop_assert_eq!(errors(&checked), expected);
        }
    }

    #[test]
    fn explicit_class_argument_checks_field(arg in arb_primitive(), field in arb_primitive()) {
        let mut b = ProgramBuilder::new();
        b.class(ClassSpec::new("Box").type_param("T").field("value", named("T")));
        let value = literal(&mut b, field);
        let init = b.object(generic("Box", vec![named(arg)]), vec![("value", value)]);
        b.push(init);
        let checked = check(b, &CheckerOptions::default());

        prop_assert_eq!(checked.display_type_of(init), Some(format!("Box<{arg}>")));
        prop_assert_eq!(checked.is_ok(), arg == field);
    }

    #[test]
    fn type_argument_count_must_match(
        params in 0usize..5,
        args in prop::collection::vec(arb_primitive(), 0..6),
    ) {
        // Omitting every argument is valid and leaves them to inference.
        prop_assume!(!(args.is_empty() && params > 0));
        let mut b = ProgramBuilder::new();
        let mut spec = ClassSpec::new("Holder");
        for i in 0..params {
            spec = spec.type_param(&format!("T{i}"));
        }
        b.class(spec);
        let ty = generic("Holder", args.iter().map(|arg| named(arg)).collect());
        let decl = b.declaration("h", false, Some(ty), None);
        b.push(decl);
        let checked = check(b, &CheckerOptions::default());

        if args.len() == params {
            prop_assert!(checked.is_ok(), "{:?}", checked.diagnostics);
            let expected = if params == 0 { "Holder".to_string() } else { format!("Holder<{}>", args.join(", ")) };
            prop_assert_eq!(checked.declared_variable(decl).map(|v| checked.display(&v.ty)), Some(expected));
        } else {
            let expected = vec![TypeError::IncorrectNumberOfTypeArguments { expected: params, found: args.len() }];
            prop_assert_eq!(errors(&checked), expected);
        }
    }

    #[test]
    fn tuple_types_follow_members(members in prop::collection::vec(arb_primitive(), 2..=10)) {
        let mut b = ProgramBuilder::new();
        let values = members.iter().map(|ty| literal(&mut b, ty)).collect();
        let tuple = b.tuple(values);
        b.push(tuple);
        let checked = check(b, &CheckerOptions::default());

        prop_assert!(checked.is_ok(), "{:?}", checked.diagnostics);
        prop_assert_eq!(checked.display_type_of(tuple), Some(format!("({})", members.join(", "))));
    }

    #[test]
    fn tuple_arity_limit_is_respected(limit in 2usize..8, len in 2usize..12) {
        let mut b = ProgramBuilder::new();
        let values = (0..len).map(|i| b.int(i as i64)).collect();
        let tuple = b.tuple(values);
        b.push(tuple);
        let options = CheckerOptions { max_tuple_arity: limit, ..CheckerOptions::default() };
        let checked = check(b, &options);

        if len > limit {
            prop_assert_eq!(errors(&checked), vec![TypeError::TooManyTupleMembers { max: limit, found: len }]);
        } else {
            prop_assert!(checked.is_ok(), "{:?}", checked.diagnostics);
        }
    }
}
